//! Centralized error types for the nestkit workspace.
//!
//! Deep lookup never fails; these errors belong to the I/O-facing helpers.

use thiserror::Error;

/// Top-level error enum. Variants map to subsystems.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NestkitError {
    #[error("Unable to persist or retrieve session data: {0}")]
    Session(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type NestkitResult<T> = Result<T, NestkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_message_is_generic() {
        let err = NestkitError::Session("quota exceeded".into());
        assert_eq!(
            err.to_string(),
            "Unable to persist or retrieve session data: quota exceeded"
        );
    }
}
