//! Request and response shapes shared by every node client

use bytes::Bytes;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Kind of an MFS entry.
///
/// Kubo tags entries with an integer in `files/ls` (`0` file, `1` directory)
/// and with a string in `files/stat` (`"file"`, `"directory"`). Both collapse
/// to this enum on deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Dir)
    }

    /// Integer tag used by `files/ls`
    pub fn code(&self) -> u8 {
        match self {
            EntryKind::File => 0,
            EntryKind::Dir => 1,
        }
    }
}

impl<'de> Deserialize<'de> for EntryKind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Tag {
            Code(u64),
            Name(String),
        }

        match Tag::deserialize(deserializer)? {
            Tag::Code(0) => Ok(EntryKind::File),
            Tag::Code(1) => Ok(EntryKind::Dir),
            Tag::Code(other) => Err(de::Error::custom(format!("unknown entry type {}", other))),
            Tag::Name(name) => match name.to_ascii_lowercase().as_str() {
                "file" => Ok(EntryKind::File),
                "directory" | "dir" => Ok(EntryKind::Dir),
                other => Err(de::Error::custom(format!("unknown entry type {:?}", other))),
            },
        }
    }
}

/// Content handed to `add`
#[derive(Clone, Debug)]
pub struct AddEntry {
    /// File name reported back by the node
    pub name: String,
    /// Raw contents
    pub data: Bytes,
}

impl AddEntry {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Response from `add`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddedObject {
    pub name: String,
    pub hash: String,
    pub size: Option<u64>,
}

/// Response from `files/stat`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeStat {
    pub hash: String,
    pub size: u64,
    #[serde(default)]
    pub cumulative_size: u64,
    #[serde(rename = "Type")]
    pub kind: EntryKind,
}

/// One entry of a `files/ls` listing
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeEntry {
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub hash: String,
}

/// Arguments of an IPNS publish
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishRequest {
    /// Path to publish, usually `/ipfs/<cid>`
    pub path: String,
    /// Keystore entry to sign with
    pub key: String,
    /// Record lifetime as a duration string (e.g. `24h`)
    pub lifetime: String,
    /// Publish without connecting to the network
    pub offline: bool,
    /// Allow publishing while the node is offline
    pub allow_offline: bool,
}

impl PublishRequest {
    pub fn new(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            lifetime: "24h".to_string(),
            offline: false,
            allow_offline: true,
        }
    }

    pub fn with_lifetime(mut self, lifetime: impl Into<String>) -> Self {
        self.lifetime = lifetime.into();
        self
    }

    pub fn with_offline(mut self, offline: bool, allow_offline: bool) -> Self {
        self.offline = offline;
        self.allow_offline = allow_offline;
        self
    }
}

/// Response from `name/publish`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Published {
    /// IPNS name (the key's peer id)
    pub name: String,
    /// Path the name now points at
    pub value: String,
}

/// Keystore entry from `key/gen` and `key/list`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyInfo {
    pub name: String,
    pub id: String,
}
