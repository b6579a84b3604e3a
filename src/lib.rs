//! # ipfs-mfs
//!
//! Filesystem access to an IPFS node's MFS, with gateway URL resolution and
//! IPNS publishing.
//!
//! - [`node`]: node capability trait, Kubo RPC client and in-memory node
//! - [`adapter`]: storage adapter, upload pipeline, gateway resolver and config

pub use mfs_adapter as adapter;
pub use mfs_node as node;

pub use mfs_adapter::{
    AdapterError, ConfigOverride, GatewayResolver, OperationalConfig, StorageAdapter,
};
pub use mfs_node::{HttpNodeClient, HttpNodeConfig, MemoryNode, NodeClient};
