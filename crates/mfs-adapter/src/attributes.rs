//! Filesystem attributes returned to callers

use mfs_node::EntryKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// Entry visibility. MFS has no access control, so entries are public.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Normalized outcome of a write
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// Absolute MFS path that was written
    pub path: String,
    pub content_hash: String,
    pub size: Option<u64>,
    pub entry_type: EntryKind,
    /// Unix seconds
    pub timestamp: i64,
    /// IPNS name, when the content was published
    pub ipns_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileAttributes {
    pub path: String,
    pub file_size: Option<u64>,
    pub visibility: Visibility,
    pub last_modified: Option<i64>,
    pub mime_type: Option<String>,
    pub extra_metadata: BTreeMap<String, String>,
}

impl FileAttributes {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_size: None,
            visibility: Visibility::Public,
            last_modified: None,
            mime_type: None,
            extra_metadata: BTreeMap::new(),
        }
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.file_size = size;
        self
    }

    pub fn with_last_modified(mut self, timestamp: i64) -> Self {
        self.last_modified = Some(timestamp);
        self
    }

    pub fn with_mime_type(mut self, mime_type: Option<String>) -> Self {
        self.mime_type = mime_type;
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.extra_metadata.insert("hash".to_string(), hash.into());
        self
    }

    pub fn hash(&self) -> Option<&str> {
        self.extra_metadata.get("hash").map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectoryAttributes {
    pub path: String,
    pub visibility: Visibility,
    pub last_modified: Option<i64>,
}

impl DirectoryAttributes {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            visibility: Visibility::Public,
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, timestamp: i64) -> Self {
        self.last_modified = Some(timestamp);
        self
    }
}

/// A listing entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageAttributes {
    File(FileAttributes),
    Dir(DirectoryAttributes),
}

impl StorageAttributes {
    pub fn path(&self) -> &str {
        match self {
            StorageAttributes::File(file) => &file.path,
            StorageAttributes::Dir(dir) => &dir.path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, StorageAttributes::Dir(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, StorageAttributes::File(_))
    }

    pub fn entry_type(&self) -> EntryKind {
        match self {
            StorageAttributes::File(_) => EntryKind::File,
            StorageAttributes::Dir(_) => EntryKind::Dir,
        }
    }
}
