//! Error types shared by the authentication, component and upload layers.

use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the library can surface to a command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("instance '{instance}' is not configured")]
    NotConfigured { instance: String },

    #[error("OAuth2 capability discovery failed: {0}")]
    CapabilityDiscoveryFailed(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Only observed by the token acquirer, which falls back to a full
    /// authentication instead of surfacing it.
    #[error("expired refresh token")]
    ExpiredRefreshToken,

    #[error("{0}")]
    UnexpectedServerResponse(String),

    #[error("An error occurred while processing the request: {0}")]
    Transport(String),

    #[error("{0}")]
    Validation(String),

    #[error("timed out waiting for the browser authorization to complete")]
    AuthorizationTimedOut,

    #[error("credential store error: {0}")]
    CredentialStore(String),
}

impl Error {
    pub fn unexpected_status(status: StatusCode) -> Self {
        Error::UnexpectedServerResponse(format!(
            "Unexpected response from server (status {})",
            status.as_u16()
        ))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
