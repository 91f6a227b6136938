//! Error taxonomy for one getcal invocation.
//!
//! Every variant is terminal for the current run: the entry point prints the
//! diagnostic on stderr and exits non-zero. There is no automatic retry.

use getcal_core::DateWindowError;
use thiserror::Error;

/// Result type for getcal operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an invocation.
#[derive(Debug, Error)]
pub enum Error {
    /// Client-secret configuration is absent or unreadable.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// The user denied the interactive consent request.
    #[error("consent denied: {0}")]
    ConsentDenied(String),

    /// No usable cached token and interactive consent was not allowed.
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    /// The stored credential can no longer be refreshed (revoked or expired
    /// refresh token), or the API rejected it mid-flight.
    #[error("credential revoked: {0}")]
    CredentialRevoked(String),

    /// The calendar query failed (network or API error).
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A command-line argument could not be parsed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The clipboard collaborator is unavailable.
    #[error("clipboard unavailable: {0}")]
    SinkUnavailable(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DateWindowError> for Error {
    fn from(err: DateWindowError) -> Self {
        match err {
            DateWindowError::InvalidDate(_) => Self::InvalidArgument(err.to_string()),
            DateWindowError::UnresolvableMidnight { .. } => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_date_maps_to_invalid_argument() {
        let err: Error = getcal_core::parse_date("2025-13-40").unwrap_err().into();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("2025-13-40"));
    }

    #[test]
    fn internal_errors_carry_a_category_prefix() {
        let err = Error::Internal("clock went backwards".into());
        assert_eq!(err.to_string(), "internal error: clock went backwards");
    }

    #[test]
    fn display_is_concise() {
        let err = Error::AuthenticationRequired("run without --non-interactive".into());
        assert_eq!(
            err.to_string(),
            "authentication required: run without --non-interactive"
        );
    }
}
