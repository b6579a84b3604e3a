//! Error types for the mfs-node crate

use thiserror::Error;

/// Result type alias using `NodeError`
pub type Result<T> = std::result::Result<T, NodeError>;

/// Errors raised by a node client.
///
/// Every capability fails with this one type; callers only distinguish
/// `NotFound` from everything else.
#[derive(Error, Debug)]
pub enum NodeError {
    /// Path, content or key not found
    #[error("not found: {0}")]
    NotFound(String),

    /// The node rejected the call
    #[error("IPFS API error: {0}")]
    Api(String),

    /// Invalid CID
    #[error("invalid CID: {0}")]
    InvalidCid(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Timeout error
    #[error("operation timed out")]
    Timeout,

    /// HTTP error
    #[error("http error: {0}")]
    Http(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl NodeError {
    /// Whether the node reported a missing entry
    pub fn is_not_found(&self) -> bool {
        matches!(self, NodeError::NotFound(_))
    }
}

impl From<reqwest::Error> for NodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NodeError::Timeout
        } else if err.is_connect() {
            NodeError::Connection(err.to_string())
        } else {
            NodeError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(err: serde_json::Error) -> Self {
        NodeError::Serialization(err.to_string())
    }
}
