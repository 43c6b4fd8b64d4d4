use serde_json::Value;
use thiserror::Error;

/// Top-level error type returned by document stores and the client API.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced document does not exist (deleted, or the id is invalid).
    #[error("document '{document_id}' not found in collection '{collection}'")]
    NotFound { collection: String, document_id: String },

    /// A document with the same id already exists.
    #[error("document '{document_id}' already exists in collection '{collection}'")]
    Conflict { collection: String, document_id: String },

    /// Reference field is neither an id string, a one-element list, nor an object with `$id`.
    #[error("malformed reference in field '{field}': {value}")]
    MalformedReference { field: String, value: Value },

    /// Backend or network failure that may succeed if repeated.
    #[error("transient backend failure: {message}")]
    Transient { message: String },

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Document payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation failed for one or more fields.
    #[error("validation failed")]
    Validation(#[from] ValidationError),

    /// Invalid input supplied to a store or query operation.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Configuration could not be read or is inconsistent.
    #[error("config error: {message}")]
    Config { message: String },
}

impl StoreError {
    pub fn not_found(collection: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            document_id: document_id.into(),
        }
    }

    pub fn malformed(field: impl Into<String>, value: Value) -> Self {
        Self::MalformedReference {
            field: field.into(),
            value,
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Classifies the error into one of the resolution failure kinds.
    ///
    /// Anything that is not a missing document or a bad reference shape is
    /// treated as transient: the resolver never retries, it only reports.
    pub fn issue_kind(&self) -> IssueKind {
        match self {
            StoreError::NotFound { .. } => IssueKind::NotFound,
            StoreError::MalformedReference { .. } => IssueKind::MalformedReference,
            _ => IssueKind::TransientFailure,
        }
    }
}

/// The three ways a reference can fail to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    NotFound,
    MalformedReference,
    TransientFailure,
}

impl IssueKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            IssueKind::NotFound => "not_found",
            IssueKind::MalformedReference => "malformed_reference",
            IssueKind::TransientFailure => "transient_failure",
        }
    }
}

/// Collection of validation issues encountered while preparing a mutation.
#[derive(Debug, Error)]
#[error("validation errors: {issues:?}")]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns `Ok(())` when no issues were collected.
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Detailed validation failure for a single field.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_issue_kinds() {
        assert_eq!(StoreError::not_found("users", "u1").issue_kind(), IssueKind::NotFound);
        assert_eq!(
            StoreError::malformed("creator", Value::Bool(true)).issue_kind(),
            IssueKind::MalformedReference
        );
        let transient = StoreError::Transient {
            message: "connection reset".to_string(),
        };
        assert_eq!(transient.issue_kind(), IssueKind::TransientFailure);
        let invalid = StoreError::InvalidRequest {
            message: "bad cursor".to_string(),
        };
        assert_eq!(invalid.issue_kind(), IssueKind::TransientFailure);
    }

    #[test]
    fn empty_validation_error_is_ok() {
        assert!(ValidationError::new([]).into_result().is_ok());
        assert!(ValidationError::single("caption", "length", "too long").into_result().is_err());
    }
}
