//! # MFS Adapter
//!
//! Filesystem adapter over an IPFS node's mutable file system (MFS).
//!
//! This crate provides:
//! - **StorageAdapter**: read/write/list/move/copy against MFS paths under a root prefix
//! - **UploadOrchestrator**: add → pin (local or remote) → copy into MFS → IPNS publish,
//!   each step switched by the operational config
//! - **GatewayResolver**: turns a CID or IPNS name into a path, subdomain or DNSLink
//!   gateway URL
//! - **OperationalConfig / ConfigOverride**: process-wide defaults and per-call overrides
//!
//! ## Example
//!
//! ```rust,ignore
//! use mfs_adapter::{ConfigOverride, OperationalConfig, StorageAdapter};
//! use mfs_node::MemoryNode;
//! use std::sync::Arc;
//!
//! let adapter = StorageAdapter::new(Arc::new(MemoryNode::new()), "", OperationalConfig::default())?;
//! adapter.write("docs/readme.txt", "hello", &ConfigOverride::new()).await?;
//!
//! let url = adapter.get_gateway_url("docs", Some("readme.txt"), &ConfigOverride::new()).await?;
//! ```

pub mod adapter;
pub mod attributes;
pub mod config;
pub mod error;
pub mod gateway;
pub mod keys;
pub mod prefixer;
pub mod upload;

pub use adapter::StorageAdapter;
pub use attributes::{
    DirectoryAttributes, FileAttributes, StorageAttributes, UploadResult, Visibility,
};
pub use config::{
    ConfigOverride, GatewayOptions, GatewayOptionsOverride, OperationalConfig, PinOptions,
    PinOptionsOverride, PublishOptions, PublishOptionsOverride,
};
pub use error::{AdapterError, Result, ValidationError};
pub use gateway::{
    GatewayConfig, GatewayResolver, GatewayService, GatewayStyle, ResolutionRequest,
    DEFAULT_GATEWAY,
};
pub use keys::{derive_key_name, resolve_key};
pub use prefixer::PathPrefixer;
pub use upload::UploadOrchestrator;
