//! CID (Content Identifier) utilities
//!
//! Content identifiers for data held by the in-memory node. Real nodes
//! compute their own; these only need to be stable and well formed.

use crate::{NodeError, Result};
use cid::Cid;
use multihash_codetable::{Code, MultihashDigest};

/// IPLD codecs the in-memory node hands out
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CidCodec {
    /// Raw binary data (0x55), used for file contents
    #[default]
    Raw,
    /// DAG-PB (0x70), used for MFS directories
    DagPb,
    /// libp2p public key (0x72), used for IPNS names
    Libp2pKey,
}

impl CidCodec {
    /// Get the multicodec code
    pub fn code(&self) -> u64 {
        match self {
            CidCodec::Raw => 0x55,
            CidCodec::DagPb => 0x70,
            CidCodec::Libp2pKey => 0x72,
        }
    }
}

/// Create a CIDv1 from data using SHA2-256
pub fn create_cid(data: &[u8], codec: CidCodec) -> Cid {
    let multihash = Code::Sha2_256.digest(data);
    Cid::new_v1(codec.code(), multihash)
}

/// Parse a CID from a string
pub fn parse_cid(s: &str) -> Result<Cid> {
    s.parse()
        .map_err(|e: cid::Error| NodeError::InvalidCid(e.to_string()))
}

/// Extract the CID from an `/ipfs/<cid>[/...]` reference
pub fn cid_from_ipfs_path(path: &str) -> Option<&str> {
    path.strip_prefix("/ipfs/")
        .map(|rest| rest.split('/').next().unwrap_or(rest))
        .filter(|cid| !cid.is_empty())
}
