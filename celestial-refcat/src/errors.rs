//! Error types for reference catalog retrieval.
//!
//! [`RefCatError`] covers every way a retrieval can fail. "No stars found" is
//! not among them: an empty [`ResultSet`](crate::query::ResultSet) is a normal
//! value that drives catalog fallback.
//!
//! | Variant | Raised when | Recoverable? |
//! |---------|-------------|--------------|
//! | [`Format`](RefCatError::Format) | Bad coordinate, radius or band, before any network call | No |
//! | [`Transport`](RefCatError::Transport) | The last mirror of a list could not be reached | Yes |
//! | [`Service`](RefCatError::Service) | A service answered with an error document | Yes |
//! | [`Exhausted`](RefCatError::Exhausted) | The terminal catalog of the fallback chain was empty | No |
//! | [`Config`](RefCatError::Config) | Configuration could not be loaded or is inconsistent | No |

use thiserror::Error;

/// Convenience alias for `Result<T, RefCatError>`.
pub type RefCatResult<T> = Result<T, RefCatError>;

#[derive(Debug, Error)]
pub enum RefCatError {
    /// Malformed coordinate, radius or band input.
    #[error("Invalid input: {message}")]
    Format { message: String },

    /// Every mirror failed and the last failure was a transport error.
    #[error("Transport failure ({service}): {message}")]
    Transport { service: String, message: String },

    /// The service was reachable but returned an error instead of data.
    #[error("Service error ({service}): {message}")]
    Service { service: String, message: String },

    /// No catalog in the fallback chain could supply data.
    #[error("Could not retrieve any catalog data: {message}")]
    Exhausted { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl RefCatError {
    pub fn format_error(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub fn transport(service: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn service(service: &str, message: impl Into<String>) -> Self {
        Self::Service {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn exhausted(message: impl Into<String>) -> Self {
        Self::Exhausted {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns `true` if another mirror or another catalog might succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Service { .. })
    }
}
