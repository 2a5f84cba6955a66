//! Error types for the medrem_core library.

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for medrem_core operations
///
/// The three variants mirror the three failure categories the boundary
/// layer needs to distinguish: configuration problems (hard failure for
/// status computation), input validation problems (rejected before any
/// durable write), and storage problems (the caller picks retry vs.
/// fail-fast). A duplicate confirmation is NOT an error - see
/// [`crate::ConfirmOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Schedule or settings are missing or malformed
    #[error("configuration error: {0}")]
    Config(String),

    /// Confirm/snooze input rejected before touching durable state
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The intake log cannot be read or written
    #[error("intake log unavailable: {0}")]
    Storage(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Error::Storage(err.to_string())
    }

    /// True for storage-category errors (the boundary may retry these)
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}
