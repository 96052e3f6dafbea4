use crate::rule::RuleValidationError;
use thiserror::Error;

/// Errors that can occur while loading rules, waiting on page content or driving a browser tab
#[derive(Error, Debug)]
pub enum RetitleError {
    /// Rule store could not be read
    #[error("Failed to read rules from store: {0}")]
    StoreRead(String),

    /// Rule store could not be written
    #[error("Failed to write rules to store: {0}")]
    StoreWrite(String),

    /// No rule with the given id exists in the store
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    /// No rule at the given position in the store
    #[error("No rule at index {index} (store holds {len} rules)")]
    RuleIndexOutOfRange { index: usize, len: usize },

    /// Rule failed authoring-time validation
    #[error("Invalid rule: {0}")]
    InvalidRule(#[from] RuleValidationError),

    /// Imported rule data was malformed
    #[error("Error importing rules: {0}")]
    Import(String),

    /// A selector matched nothing at extraction time
    #[error("Selector '{selector}' for field '{field}' matched no element")]
    ExtractionFailed { field: String, selector: String },

    /// Selectors did not all resolve within the configured wait
    #[error("Timed out after {waited_ms}ms waiting for selectors: {pending:?}")]
    ExtractionTimeout { waited_ms: u128, pending: Vec<String> },

    /// The page was torn down while waiting for content
    #[error("Document detached before selectors resolved")]
    DocumentDetached,

    /// Document query or update failed
    #[error("Document operation failed: {0}")]
    Document(String),

    /// Selector could not be parsed
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Failed to connect to browser
    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    /// Navigation failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// JavaScript evaluation failed
    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RetitleError {
    /// True for failures that only affect a single rule's pipeline
    pub fn is_rule_local(&self) -> bool {
        matches!(
            self,
            RetitleError::ExtractionFailed { .. }
                | RetitleError::ExtractionTimeout { .. }
                | RetitleError::DocumentDetached
                | RetitleError::Document(_)
                | RetitleError::InvalidSelector { .. }
                | RetitleError::EvaluationFailed(_)
        )
    }
}

/// Result type alias for retitle operations
pub type Result<T> = std::result::Result<T, RetitleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_failure_message() {
        let err = RetitleError::ExtractionFailed {
            field: "order".to_string(),
            selector: "#order-id".to_string(),
        };
        assert_eq!(err.to_string(), "Selector '#order-id' for field 'order' matched no element");
        assert!(err.is_rule_local());
    }

    #[test]
    fn test_store_errors_are_not_rule_local() {
        assert!(!RetitleError::StoreRead("disk".into()).is_rule_local());
        assert!(!RetitleError::StoreWrite("disk".into()).is_rule_local());
    }
}
