//! Error types for the adapter

use crate::gateway::{GatewayService, GatewayStyle};
use mfs_node::NodeError;
use thiserror::Error;

/// Result type alias using `AdapterError`
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Input rejected before any node call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("gateway does not support service: {0}")]
    UnsupportedService(String),

    #[error("gateway does not support style: {0}")]
    UnsupportedStyle(String),

    #[error("gateway with service \"{service}\" and style \"{style}\" requires {}", .service.identifier_name())]
    MissingIdentifier {
        service: GatewayService,
        style: GatewayStyle,
    },

    #[error("gateway with style \"{style}\" requires a domain")]
    MissingDomain { style: GatewayStyle },

    #[error("path escapes the adapter root: {0}")]
    InvalidPath(String),

    #[error("cannot derive an IPNS key name from {0:?}")]
    UnnamedKey(String),
}

/// Adapter errors
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Stat/read/metadata against a path the node does not have
    #[error("not found: {location}: {message}")]
    NotFound { location: String, message: String },

    /// Any node failure during the add/pin/copy/publish sequence
    #[error("unable to write {location}: {source}")]
    UploadFailed {
        location: String,
        #[source]
        source: NodeError,
    },

    /// Any other node failure
    #[error("unable to {operation} {location}: {source}")]
    Transport {
        operation: &'static str,
        location: String,
        #[source]
        source: NodeError,
    },

    #[error("unable to detect mime type of {0}")]
    UnknownMimeType(String),

    #[error("{0} is a directory")]
    IsDirectory(String),
}

impl AdapterError {
    /// Wrap a node error, keeping missing entries distinguishable
    pub fn from_node(operation: &'static str, location: &str, err: NodeError) -> Self {
        match err {
            NodeError::NotFound(message) => AdapterError::NotFound {
                location: location.to_string(),
                message,
            },
            source => AdapterError::Transport {
                operation,
                location: location.to_string(),
                source,
            },
        }
    }

    /// Re-label a node failure as part of an upload
    pub(crate) fn into_upload_failure(self, location: &str) -> Self {
        match self {
            AdapterError::Transport { source, .. } => AdapterError::UploadFailed {
                location: location.to_string(),
                source,
            },
            AdapterError::NotFound { message, .. } => AdapterError::UploadFailed {
                location: location.to_string(),
                source: NodeError::NotFound(message),
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AdapterError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AdapterError::Validation(_))
    }

    pub fn is_missing_identifier(&self) -> bool {
        matches!(
            self,
            AdapterError::Validation(ValidationError::MissingIdentifier { .. })
        )
    }
}
