//! Structured error types for the informe layout engine.
//!
//! Three variants cover the real failure sources: snapshot parsing, page
//! geometry configuration, and pre-generation report validation. Layout
//! itself cannot fail once geometry is accepted: malformed text decomposes
//! into plain paragraphs and missing image metadata falls back to a fixed
//! box, so neither produces an error.

use thiserror::Error;

/// The unified error type returned by all public API functions.
#[derive(Error, Debug)]
pub enum InformeError {
    /// Snapshot JSON failed to parse or did not match the report schema.
    #[error("failed to parse report snapshot: {source}\n  hint: {hint}")]
    Snapshot {
        source: serde_json::Error,
        hint: String,
    },

    /// Page geometry leaves no usable vertical space. Raised before any
    /// layout work starts, never mid-flow.
    #[error("invalid page geometry: {0}")]
    Geometry(String),

    /// The report is missing fields required for generation.
    #[error("report validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Convenience Result type alias for InformeError.
pub type Result<T> = std::result::Result<T, InformeError>;

impl From<serde_json::Error> for InformeError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "check for trailing commas, missing quotes, or unescaped characters".to_string()
            }
            serde_json::error::Category::Data => {
                "the JSON is valid but doesn't match the report schema; check field names and types"
                    .to_string()
            }
            serde_json::error::Category::Eof => {
                "unexpected end of input, the snapshot may be truncated".to_string()
            }
            serde_json::error::Category::Io => "I/O failure while reading the snapshot".to_string(),
        };
        InformeError::Snapshot { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_hint() {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let wrapped = InformeError::from(err);
        match &wrapped {
            InformeError::Snapshot { hint, .. } => {
                assert!(hint.contains("quotes"), "syntax hint, got: {}", hint)
            }
            other => panic!("expected Snapshot, got {:?}", other),
        }
        assert!(wrapped.to_string().contains("hint:"));
    }

    #[test]
    fn test_truncated_input_hint() {
        let err = serde_json::from_str::<serde_json::Value>("{\"a\": ").unwrap_err();
        match InformeError::from(err) {
            InformeError::Snapshot { hint, .. } => assert!(hint.contains("truncated")),
            other => panic!("expected Snapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_display_joins_messages() {
        let err = InformeError::Validation(vec!["uno".to_string(), "dos".to_string()]);
        assert_eq!(err.to_string(), "report validation failed: uno; dos");
    }
}
