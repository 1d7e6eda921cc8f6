//! Session error types

use std::fmt;
use thiserror::Error;

/// Errors that can occur during session store construction or operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// Invalid store configuration. Only raised while building a store.
    #[error("Invalid session store configuration: {0}")]
    Config(String),

    /// Error reported by the embedded database
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Error during serialization/deserialization of session data
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        SessionError::Config(msg.into())
    }
}

/// A failed store operation.
///
/// Carries the underlying error together with the value a caller can fall
/// back on when it chooses to ignore the error: `{}` for a read, `[]` for a
/// listing, `+inf` for a count and `()` for writes.
#[derive(Debug)]
pub struct Failed<F> {
    /// What went wrong
    pub source: SessionError,
    /// Substitute result
    pub fallback: F,
}

impl<F> Failed<F> {
    pub fn new(source: SessionError, fallback: F) -> Self {
        Self { source, fallback }
    }

    /// Split into the error-first `(error, result)` pair used by
    /// callback-style session middleware.
    pub fn into_parts(self) -> (SessionError, F) {
        (self.source, self.fallback)
    }
}

impl<F> fmt::Display for Failed<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl<F: fmt::Debug> std::error::Error for Failed<F> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Acknowledgment of a write: the number of rows the statement changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteAck {
    pub changes: usize,
}

/// Result of a write operation (`set`, `destroy`, `touch`, `clear`)
pub type WriteResult = Result<WriteAck, Failed<()>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_displays_source() {
        let failed = Failed::new(SessionError::config("ttl is required"), 0u8);
        assert_eq!(
            failed.to_string(),
            "Invalid session store configuration: ttl is required"
        );

        let (err, fallback) = failed.into_parts();
        assert!(matches!(err, SessionError::Config(_)));
        assert_eq!(fallback, 0);
    }

    #[test]
    fn test_serde_error_converts() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SessionError = err.into();
        assert!(matches!(err, SessionError::Serialization(_)));
    }
}
