//! Error types for trellis operations.
//!
//! ## Error Philosophy
//!
//! The graph core fails loudly and retries nowhere:
//! - Store failures propagate uncaught to the caller; retry/backoff policy
//!   belongs to the orchestration layer, not this crate.
//! - Identity hashing is total and has no error path at all.
//! - Analyses never fail on graph shape: edges pointing at unknown entities
//!   simply match nothing, and "no reachable boundary" is a valid result.
//!
//! What remains is infrastructure: the store backend, snapshot and
//! configuration files, and their serialization formats.

use thiserror::Error;

/// Result type for trellis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for trellis operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Graph store backend failed
    #[error("store error: {0}")]
    Store(String),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failed
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Invalid configuration or policy file
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a store-backend error.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_includes_message() {
        let error = Error::store("partition scan timed out");
        assert_eq!(error.to_string(), "store error: partition scan timed out");
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing snapshot");
        let error = Error::from(io);
        assert!(matches!(error, Error::Io(_)));
        assert!(error.to_string().contains("missing snapshot"));
    }

    #[test]
    fn serde_error_converts_via_from() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json");
        let error = Error::from(bad.unwrap_err());
        assert!(matches!(error, Error::Serialize(_)));
    }
}
