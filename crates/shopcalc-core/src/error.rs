use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopcalcError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ShopcalcError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ShopcalcError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ShopcalcError {
    fn from(e: serde_json::Error) -> Self {
        ShopcalcError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message() {
        let err = ShopcalcError::invalid("markup_percentage", "Must be between 1 and 300");
        assert_eq!(
            err.to_string(),
            "Invalid input: markup_percentage — Must be between 1 and 300"
        );
    }

    #[test]
    fn test_from_serde_error() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: ShopcalcError = parse.unwrap_err().into();
        assert!(matches!(err, ShopcalcError::SerializationError(_)));
    }
}
