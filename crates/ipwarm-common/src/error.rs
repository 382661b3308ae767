//! Error types for ipwarm

use thiserror::Error;

/// Main error type for ipwarm
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The stored record changed between read and write
    #[error("Concurrency conflict on {entity} '{key}': expected version {expected}")]
    Conflict {
        entity: String,
        key: String,
        expected: i64,
    },

    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("IP provisioner error: {0}")]
    Provisioner(String),

    /// The pool-bound half of a split went out, the overflow half did not
    #[error("Partial delivery (on-pool message {message_id_on_pool}): {source}")]
    PartialDelivery {
        message_id_on_pool: String,
        #[source]
        source: Box<Error>,
    },

    /// The final day's quota was met and recorded, but the pool could not be deleted
    #[error("Warm-up of pool '{pool_name}' completed but the pool was not deleted: {source}")]
    PoolTeardown {
        pool_name: String,
        message_id_on_pool: Option<String>,
        message_id_not_on_pool: Option<String>,
        #[source]
        source: Box<Error>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for ipwarm
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Database(_) => "DATABASE_ERROR",
            Error::Storage(_) => "STORAGE_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Conflict { .. } => "CONFLICT",
            Error::Transport(_) => "TRANSPORT_ERROR",
            Error::Provisioner(_) => "PROVISIONER_ERROR",
            Error::PartialDelivery { .. } => "PARTIAL_DELIVERY",
            Error::PoolTeardown { .. } => "POOL_TEARDOWN_ERROR",
            Error::Cancelled => "CANCELLED",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
            Error::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the whole operation can be retried as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_retryable() {
        let err = Error::Conflict {
            entity: "WarmupStatus".to_string(),
            key: "mypool".to_string(),
            expected: 3,
        };
        assert!(err.is_retryable());
        assert_eq!(err.code(), "CONFLICT");
        assert!(!Error::Transport("rejected".to_string()).is_retryable());
        assert!(!Error::NotFound("mypool".to_string()).is_retryable());
    }

    #[test]
    fn test_partial_delivery_keeps_source() {
        let err = Error::PartialDelivery {
            message_id_on_pool: "abc123".to_string(),
            source: Box::new(Error::Transport("503 Service Unavailable".to_string())),
        };

        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("Mail transport error: 503 Service Unavailable")
        );
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_pool_teardown_is_not_retryable() {
        let err = Error::PoolTeardown {
            pool_name: "mypool".to_string(),
            message_id_on_pool: Some("abc123".to_string()),
            message_id_not_on_pool: None,
            source: Box::new(Error::Provisioner("500 Internal Server Error".to_string())),
        };

        assert!(!err.is_retryable());
        assert_eq!(err.code(), "POOL_TEARDOWN_ERROR");
        assert!(err.to_string().contains("mypool"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
