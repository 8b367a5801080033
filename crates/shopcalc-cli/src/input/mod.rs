pub mod file;
pub mod stdin;

use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;

/// Start a command's input document from `--input`, piped stdin, or an
/// empty object when neither is present.
pub fn load_document(path: Option<&str>) -> Result<Value, Box<dyn Error>> {
    if let Some(path) = path {
        return file::read_document(path);
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(value),
        None => Ok(Value::Object(Map::new())),
    }
}

/// Like `load_document`, but the command cannot run on flags alone.
pub fn require_document(path: Option<&str>, command: &str) -> Result<Value, Box<dyn Error>> {
    let doc = load_document(path)?;
    if doc.as_object().is_some_and(|m| m.is_empty()) {
        return Err(format!("--input <file.json|file.yaml> or stdin required for {command}").into());
    }
    Ok(doc)
}

/// Write an explicit flag value at `path`, replacing what the document had.
pub fn set_field<T: Serialize>(
    doc: &mut Value,
    path: &[&str],
    value: Option<T>,
) -> Result<(), Box<dyn Error>> {
    place(doc, path, value, true)
}

/// Fill `path` from a profile default unless the document already has it.
pub fn default_field<T: Serialize>(
    doc: &mut Value,
    path: &[&str],
    value: Option<T>,
) -> Result<(), Box<dyn Error>> {
    place(doc, path, value, false)
}

fn place<T: Serialize>(
    doc: &mut Value,
    path: &[&str],
    value: Option<T>,
    overwrite: bool,
) -> Result<(), Box<dyn Error>> {
    let Some(value) = value else {
        return Ok(());
    };
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };
    let mut node = doc;
    for key in parents {
        node = object_mut(node)?
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    let map = object_mut(node)?;
    let present = map.get(*last).is_some_and(|v| !v.is_null());
    if overwrite || !present {
        map.insert(last.to_string(), serde_json::to_value(value)?);
    }
    Ok(())
}

fn object_mut(node: &mut Value) -> Result<&mut Map<String, Value>, Box<dyn Error>> {
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    node.as_object_mut()
        .ok_or_else(|| "input document must be an object".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flags_override_document() {
        let mut doc = json!({ "params": { "operating_expenses": "500" } });
        set_field(&mut doc, &["params", "operating_expenses"], Some("750")).unwrap();
        assert_eq!(doc["params"]["operating_expenses"], "750");
    }

    #[test]
    fn test_defaults_fill_gaps_only() {
        let mut doc = json!({ "growth_rate": "3" });
        default_field(&mut doc, &["growth_rate"], Some("10")).unwrap();
        default_field(&mut doc, &["forecast_months"], Some(12)).unwrap();
        default_field(&mut doc, &["params", "target_profit_per_month"], Some("2000")).unwrap();
        assert_eq!(doc["growth_rate"], "3");
        assert_eq!(doc["forecast_months"], 12);
        assert_eq!(doc["params"]["target_profit_per_month"], "2000");
    }

    #[test]
    fn test_none_is_a_no_op() {
        let mut doc = json!({});
        set_field::<u32>(&mut doc, &["months"], None).unwrap();
        assert_eq!(doc, json!({}));
    }

    #[test]
    fn test_non_object_document_rejected() {
        let mut doc = json!([1, 2]);
        assert!(set_field(&mut doc, &["x"], Some(1)).is_err());
    }
}
