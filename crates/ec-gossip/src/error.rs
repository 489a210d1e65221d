use thiserror::Error;

#[derive(Debug, Error)]
pub enum GossipError {
    #[error("mesh token missing or invalid")]
    InvalidToken,

    #[error("peer not found: {0}")]
    PeerNotFound(String),

    #[error("http request failed: {0}")]
    Http(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("envelope signature invalid")]
    SignatureInvalid,
}

impl From<reqwest::Error> for GossipError {
    fn from(e: reqwest::Error) -> Self {
        GossipError::Http(e.to_string())
    }
}

impl From<serde_json::Error> for GossipError {
    fn from(e: serde_json::Error) -> Self {
        GossipError::Serialization(e.to_string())
    }
}
