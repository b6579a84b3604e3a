//! # MFS Node
//!
//! Capability layer over an IPFS node for the ipfs-mfs adapter.
//!
//! This crate provides:
//! - **NodeClient**: the set of node calls the adapter relies on (add, MFS
//!   files API, IPNS keys and publishing, remote pinning)
//! - **HttpNodeClient**: Kubo RPC implementation over HTTP
//! - **MemoryNode**: in-memory node with Kubo semantics, for tests and dry runs
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              mfs-adapter                │
//! ├─────────────────────────────────────────┤
//! │           NodeClient Trait              │
//! ├────────────────────┬────────────────────┤
//! │   HttpNodeClient   │     MemoryNode     │
//! ├────────────────────┴────────────────────┤
//! │            Kubo RPC (/api/v0)           │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use mfs_node::{HttpNodeClient, HttpNodeConfig, NodeClient};
//!
//! let node = HttpNodeClient::connect(HttpNodeConfig::with_url("http://localhost:5001")).await?;
//! let stat = node.stat("/some/file.txt").await?;
//! ```

pub mod cid_utils;
pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use cid_utils::{create_cid, CidCodec};
pub use error::{NodeError, Result};
pub use http::{HttpNodeClient, HttpNodeConfig};
pub use memory::{Capability, MemoryNode};
pub use types::{
    AddEntry, AddedObject, EntryKind, KeyInfo, NodeEntry, NodeStat, PublishRequest, Published,
};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Calls the adapter makes against an IPFS node.
///
/// Every call either completes or fails atomically with a `NodeError`.
/// Implementations do not retry.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Add content to the blockstore, optionally pinning it
    async fn add(&self, entry: AddEntry, pin: bool) -> Result<AddedObject>;

    /// Stat an MFS path
    async fn stat(&self, path: &str) -> Result<NodeStat>;

    /// Read a whole MFS file
    async fn read(&self, path: &str) -> Result<Bytes>;

    /// Read an MFS file as a stream
    async fn read_stream(&self, path: &str) -> Result<ByteStream>;

    /// List an MFS directory with hashes and sizes
    async fn ls(&self, path: &str) -> Result<Vec<NodeEntry>>;

    /// Move an MFS entry
    async fn mv(&self, from: &str, to: &str) -> Result<()>;

    /// Copy an MFS entry or an `/ipfs/<cid>` reference into MFS
    async fn cp(&self, from: &str, to: &str) -> Result<()>;

    /// Remove an MFS entry
    async fn rm(&self, path: &str, recursive: bool) -> Result<()>;

    /// Create an MFS directory
    async fn mkdir(&self, path: &str, parents: bool) -> Result<()>;

    /// Publish an IPNS record
    async fn publish(&self, request: PublishRequest) -> Result<Published>;

    /// Generate a new keypair in the keystore
    async fn key_gen(&self, name: &str) -> Result<KeyInfo>;

    /// List keystore entries
    async fn key_list(&self) -> Result<Vec<KeyInfo>>;

    /// Pin a CID against a remote pinning service registered on the node
    async fn remote_pin_add(&self, service: &str, cid: &str) -> Result<()>;
}
