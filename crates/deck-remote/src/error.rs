use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Transport(#[from] deck_transport::TransportError),
    #[error("malformed response from remote: {0}")]
    InvalidResponse(String),
    #[error("unknown layout: {0}")]
    UnknownLayout(String),
    #[error("no slide at index {index}")]
    NotFound { index: usize },
    #[error("export failed: {0}")]
    Export(String),
}
