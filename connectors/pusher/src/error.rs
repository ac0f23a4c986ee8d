//! Pusher error types.

use thiserror::Error;

/// Pusher client errors.
///
/// Authentication failures on inbound webhooks are deliberately absent: they
/// surface as `Ok(None)` from the validator, never as an error.
#[derive(Error, Debug)]
pub enum PusherError {
    /// An argument had the wrong shape (e.g. a header that is not UTF-8 text).
    #[error("Invalid type: {0}")]
    InvalidType(String),

    /// An argument was well-typed but syntactically invalid.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A parameter value could not be canonicalized.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Client configuration is incomplete or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration URL could not be parsed.
    #[error("URL parsing failed: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Pusher API answered with a non-success status.
    #[error("Pusher API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or status reason.
        message: String,
    },
}

impl PusherError {
    /// Shorthand for an [`PusherError::InvalidValue`].
    pub(crate) fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }

    /// Shorthand for an [`PusherError::InvalidType`].
    pub(crate) fn invalid_type(message: impl Into<String>) -> Self {
        Self::InvalidType(message.into())
    }

    /// Whether the error was caused by caller input rather than the network.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidType(_) | Self::InvalidValue(_) | Self::Encoding(_)
        )
    }
}

/// Result type for Pusher operations.
pub type PusherResult<T> = Result<T, PusherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(PusherError::invalid_value("bad channel").is_input_error());
        assert!(PusherError::invalid_type("not text").is_input_error());
        assert!(PusherError::Encoding("NaN".into()).is_input_error());
        assert!(!PusherError::Config("missing key".into()).is_input_error());
        assert!(
            !PusherError::Api {
                status: 401,
                message: "unauthorized".into()
            }
            .is_input_error()
        );
    }

    #[test]
    fn test_error_display() {
        let err = PusherError::Api {
            status: 413,
            message: "Request Entity Too Large".into(),
        };
        assert_eq!(err.to_string(), "Pusher API error 413: Request Entity Too Large");
    }
}
