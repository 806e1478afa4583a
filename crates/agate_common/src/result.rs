//! Common result and error types for the Agate backend.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable internal error (a bug in Agate), not a
/// problem with the user's design. Design problems are reported as
/// diagnostics and typed translation errors instead.
pub type AgateResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in Agate, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("pool index out of range");
        assert_eq!(format!("{err}"), "internal error: pool index out of range");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "oops".to_string().into();
        assert_eq!(err.message, "oops");
    }
}
