//! Typed error handling for deadfunc.
//!
//! The engine core is a pure computation with one precondition failure
//! mode; these types exist for the embedding surface, so library consumers
//! can match on what went wrong instead of parsing strings.

use thiserror::Error;

/// Main error type for deadfunc operations.
#[derive(Error, Debug)]
pub enum DeadfuncError {
    /// Analysis was requested with no entry points.
    #[error("no root functions given")]
    EmptyRoots,

    /// A root is not an executable entry point.
    #[error("invalid root {function}: {message}")]
    InvalidRoot { function: String, message: String },

    /// Internal invariant violation.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl DeadfuncError {
    /// Create an invalid-root error.
    pub fn invalid_root(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRoot {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if the caller can recover by fixing its inputs.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyRoots | Self::InvalidRoot { .. })
    }
}

/// Convenience type alias for deadfunc results.
pub type DeadfuncResult<T> = Result<T, DeadfuncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_root_message() {
        let err = DeadfuncError::invalid_root("app.Map", "uninstantiated generic template");
        assert!(matches!(err, DeadfuncError::InvalidRoot { .. }));
        assert!(err.to_string().contains("app.Map"));
        assert!(err.to_string().contains("template"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(DeadfuncError::EmptyRoots.is_recoverable());
        assert!(DeadfuncError::invalid_root("f", "template").is_recoverable());
        assert!(!DeadfuncError::internal("table corrupt").is_recoverable());
    }
}
