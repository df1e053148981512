//! Error types for connection and provisioning operations.

use thiserror::Error;

/// Result type for all operations in this crate.
pub type VectorResult<T, E = VectorError> = std::result::Result<T, E>;

/// Broad failure classes reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorCategory {
    /// The server could not be reached or no connection is open.
    Connection,
    /// A connection exists but the server did not answer the liveness check.
    Verification,
    /// Collection, index or insert failures.
    Provisioning,
}

/// Connection and provisioning errors.
#[derive(Debug, Error)]
pub enum VectorError {
    /// The server could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// No connection is registered under the alias.
    #[error("no active connection for alias '{alias}'")]
    NotConnected { alias: String },

    /// The liveness check failed.
    #[error("verification failed: {0}")]
    Verification(String),

    /// Collection not found.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// Schema descriptor is malformed or unsupported.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Vector dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A string value is longer than the field's declared maximum.
    #[error("field '{field}' holds {actual} characters, max is {max_length}")]
    FieldTooLong {
        field: String,
        max_length: usize,
        actual: usize,
    },

    /// Index creation or inspection failed.
    #[error("index error on '{collection}': {reason}")]
    Index { collection: String, reason: String },

    /// The server rejected a request.
    #[error("server returned code {code}: {message}")]
    Server { code: i64, message: String },

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(String),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl VectorError {
    /// Creates a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a not connected error.
    pub fn not_connected(alias: impl Into<String>) -> Self {
        Self::NotConnected {
            alias: alias.into(),
        }
    }

    /// Creates a verification error.
    pub fn verification(msg: impl Into<String>) -> Self {
        Self::Verification(msg.into())
    }

    /// Creates a collection not found error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound(name.into())
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        Self::InvalidSchema(msg.into())
    }

    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Creates a field too long error.
    pub fn field_too_long(field: impl Into<String>, max_length: usize, actual: usize) -> Self {
        Self::FieldTooLong {
            field: field.into(),
            max_length,
            actual,
        }
    }

    /// Creates an index error.
    pub fn index(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Index {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Creates a server error.
    pub fn server(code: i64, message: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: message.into(),
        }
    }

    /// Creates a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Creates an invalid config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Returns the operator-facing failure class of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection(_) | Self::NotConnected { .. } | Self::Http(_) => {
                ErrorCategory::Connection
            }
            Self::Verification(_) => ErrorCategory::Verification,
            _ => ErrorCategory::Provisioning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_failure_class() {
        assert_eq!(
            VectorError::connection("refused").category(),
            ErrorCategory::Connection
        );
        assert_eq!(
            VectorError::not_connected("default").category(),
            ErrorCategory::Connection
        );
        assert_eq!(
            VectorError::verification("no version").category(),
            ErrorCategory::Verification
        );
        assert_eq!(
            VectorError::dimension_mismatch(768, 3).category(),
            ErrorCategory::Provisioning
        );
        assert_eq!(
            VectorError::server(1100, "bad request").category(),
            ErrorCategory::Provisioning
        );
    }

    #[test]
    fn messages_carry_details() {
        let err = VectorError::field_too_long("text", 2000, 2001);
        assert_eq!(
            err.to_string(),
            "field 'text' holds 2001 characters, max is 2000"
        );
        assert_eq!(ErrorCategory::Verification.to_string(), "verification");
    }
}
