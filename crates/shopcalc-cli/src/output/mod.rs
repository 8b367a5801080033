pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use colored::Colorize;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
///
/// CSV and minimal output carry only the result, so the envelope's warnings
/// go to stderr for those formats and stdout stays machine-readable.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => {
            csv_out::print_csv(value);
            report_warnings(value);
        }
        OutputFormat::Minimal => {
            minimal::print_minimal(value);
            report_warnings(value);
        }
    }
}

fn envelope_warnings(value: &Value) -> Vec<&str> {
    value
        .get("warnings")
        .and_then(Value::as_array)
        .map(|ws| ws.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn report_warnings(value: &Value) {
    for w in envelope_warnings(value) {
        eprintln!("{}: {}", "warning".yellow().bold(), w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_warnings() {
        let envelope = json!({
            "result": { "total_owed": "80" },
            "warnings": ["Customer 'Deli' has no balance date; aged as current", 7],
        });
        assert_eq!(
            envelope_warnings(&envelope),
            vec!["Customer 'Deli' has no balance date; aged as current"]
        );
        assert!(envelope_warnings(&json!({ "result": 1 })).is_empty());
    }
}
