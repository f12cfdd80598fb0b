//! Error types for the KT tutor service.

use thiserror::Error;

/// Result type alias using the tutor error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the tutor service.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found (document or session)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External service error (text extraction, LLM)
    #[error("External service error: {0}")]
    External(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::WithContext { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Check if this is an input validation error.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::InvalidInput(_) => true,
            Self::WithContext { source, .. } => source.is_invalid_input(),
            _ => false,
        }
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::WithContext { source, .. } => source.status_code(),
            _ => 500,
        }
    }

    /// Message suitable for an HTTP response body.
    ///
    /// Client errors carry their message verbatim; server-side errors keep
    /// the full chain so the caller sees what failed during setup.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::InvalidInput(msg) => msg.clone(),
            Self::WithContext { source, .. } if source.status_code() < 500 => source.message(),
            other => other.to_string(),
        }
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(Error::NotFound("test".into()).status_code(), 404);
        assert_eq!(Error::InvalidInput("test".into()).status_code(), 400);
        assert_eq!(Error::External("test".into()).status_code(), 500);
        assert_eq!(Error::Internal("test".into()).status_code(), 500);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::Internal("join failed".into());
        let with_ctx = err.with_context("loading document");
        assert!(matches!(with_ctx, Error::WithContext { .. }));
        assert_eq!(with_ctx.status_code(), 500);
    }

    #[test]
    fn test_client_error_message_is_verbatim() {
        let err = Error::InvalidInput("Project name is required.".into());
        assert_eq!(err.message(), "Project name is required.");

        let wrapped = Error::NotFound("Session not found.".into()).with_context("reply");
        assert_eq!(wrapped.status_code(), 404);
        assert_eq!(wrapped.message(), "Session not found.");
        assert!(wrapped.is_not_found());
    }

    #[test]
    fn test_server_error_message_keeps_chain() {
        let err = Error::Internal("worker panicked".into()).with_context("starting session");
        assert_eq!(
            err.message(),
            "starting session: Internal error: worker panicked"
        );
    }
}
