use colored::Colorize;
use serde_json::Value;

/// Render the full envelope. Pretty for a terminal, one line per result
/// when piped so downstream tools can read it as JSON lines.
pub fn render_json(value: &Value, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

pub fn print_json(value: &Value) {
    match render_json(value, atty::is(atty::Stream::Stdout)) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{}: JSON serialization error: {}", "error".red().bold(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_piped_output_is_one_line() {
        let envelope = json!({
            "result": { "net_profit": "1250.00", "break_even_grams": "84.2" },
            "warnings": ["ROI is undefined (denominator is 0); reported as 0"],
        });
        let line = render_json(&envelope, false).unwrap();
        assert!(!line.contains('\n'));
        // Decimals stay strings so no precision is lost on the way out
        assert!(line.contains("\"net_profit\":\"1250.00\""));

        let pretty = render_json(&envelope, true).unwrap();
        assert!(pretty.lines().count() > 1);
        let back: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(back, envelope);
    }
}
