//! Error types for the catalog cache layer.
//!
//! "Nothing there" is not an error: a well-formed miss is reported as
//! [`crate::repository::Lookup::NotFound`]. Everything in this module is a
//! genuine failure of a store call or of the caller's input.

use std::fmt;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the catalog cache layer.
#[derive(Debug, Clone)]
pub enum Error {
    /// Serialization failed when converting an entity to cache bytes.
    SerializationError(String),

    /// Deserialization failed: a value was retrieved but does not match the
    /// expected schema.
    ///
    /// Raised by both stores. Never coerced into a miss, so that corrupt data
    /// stays distinguishable from absent data.
    DeserializationError(String),

    /// Cache store error (Redis connection lost, pool exhausted, etc).
    ///
    /// **Recovery:** the service treats a failed cache read as a miss and
    /// falls back to the search store.
    BackendError(String),

    /// Search store error (connection refused, non-success response, etc).
    ///
    /// The search store is the source of truth, so there is no fallback.
    SearchError(String),

    /// A store call exceeded its configured timeout.
    Timeout(String),

    /// Caller supplied query parameters that cannot be used.
    ValidationError(String),

    /// Configuration error during startup.
    ///
    /// Common causes:
    /// - Non-numeric port or TTL in the environment
    /// - Invalid connection string
    ConfigError(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// True when the failure means a store could not be reached in time.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Error::BackendError(_) | Error::SearchError(_) | Error::Timeout(_)
        )
    }

    /// True when a stored value did not match the entity schema.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::DeserializationError(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::BackendError(msg) => write!(f, "Cache backend error: {}", msg),
            Error::SearchError(msg) => write!(f, "Search backend error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}

#[cfg(feature = "elasticsearch")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(format!("Search request timed out: {}", e))
        } else if e.is_decode() {
            Error::DeserializationError(format!("Search response: {}", e))
        } else {
            Error::SearchError(e.to_string())
        }
    }
}
