use std::io;

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication cancelled")]
    Cancelled,

    #[error("state mismatch - possible CSRF attack")]
    StateMismatch,

    #[error("missing authorization code")]
    MissingCode,

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("failed to bind to port {port}: {reason}")]
    PortBinding { port: u16, reason: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("authentication timed out")]
    Timeout,

    #[error("not authenticated")]
    NotAuthenticated,
}

impl From<deck_transport::TransportError> for AuthError {
    fn from(error: deck_transport::TransportError) -> Self {
        AuthError::Network(error.to_string())
    }
}
