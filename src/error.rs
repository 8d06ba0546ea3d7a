//! Error taxonomy for the session and API access core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The user denied or dismissed the consent page.
    #[error("Authorization was cancelled by the user")]
    UserCancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    /// Code or refresh exchange against the token endpoint failed. `status` is
    /// set when the endpoint answered, and unset for transport failures.
    #[error("Token exchange failed: {message}")]
    TokenExchangeFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("{method} {path} failed after {attempts} attempts (last status: {last_status:?})")]
    RetryExhausted {
        method: String,
        path: String,
        attempts: u32,
        last_status: Option<u16>,
    },

    /// No usable access credential could be produced. The session needs a new login.
    #[error("No usable access token, please run sporbpm auth")]
    AuthUnavailable,

    #[error("Credential store error: {0}")]
    Storage(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Spotify URI: {0}")]
    InvalidUri(String),

    /// The local OAuth redirect server could not be started.
    #[error("Callback server error: {0}")]
    CallbackServer(String),
}

impl SessionError {
    /// The token endpoint refused the grant itself, as opposed to being unreachable.
    pub fn is_rejected_grant(&self) -> bool {
        matches!(
            self,
            SessionError::TokenExchangeFailed {
                status: Some(400 | 401),
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
