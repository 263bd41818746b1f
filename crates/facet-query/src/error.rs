//! Error types for reading externally supplied query documents.

use thiserror::Error;

/// Errors that can occur when decoding a shared query document.
///
/// These are only raised for input that is not a document at all. Documents
/// with unfamiliar clauses still decode; see [`crate::Clause::from_value`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source text is not valid JSON.
    #[error("source is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The source is JSON but not an object.
    #[error("source must be a JSON object, found {found}")]
    NotAnObject {
        /// Kind of JSON value that was found instead.
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_an_object_display() {
        let err = SourceError::NotAnObject { found: "array" };
        assert_eq!(err.to_string(), "source must be a JSON object, found array");
    }

    #[test]
    fn invalid_json_display() {
        let err = SourceError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        assert!(err.to_string().starts_with("source is not valid JSON"));
    }
}
