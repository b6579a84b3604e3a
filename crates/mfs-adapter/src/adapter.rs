//! Filesystem facade over an IPFS node

use crate::attributes::{DirectoryAttributes, FileAttributes, StorageAttributes, Visibility};
use crate::config::{ConfigOverride, OperationalConfig};
use crate::error::{AdapterError, Result};
use crate::gateway::{GatewayResolver, ResolutionRequest};
use crate::prefixer::PathPrefixer;
use crate::upload::{ensure_nameable_key, publish_hash, UploadOrchestrator};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use mfs_node::{ByteStream, NodeClient, NodeStat};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Hierarchical filesystem view of an IPFS node's MFS.
///
/// Logical paths are relative to the adapter root; `.` and `..` are resolved
/// and may not leave it. Every call that accepts a [`ConfigOverride`] merges
/// it over the adapter defaults for that call only.
pub struct StorageAdapter {
    node: Arc<dyn NodeClient>,
    prefixer: PathPrefixer,
    defaults: OperationalConfig,
}

impl StorageAdapter {
    /// Create an adapter rooted at `prefix`. Fails when the default gateway
    /// service or style is unsupported.
    pub fn new(
        node: Arc<dyn NodeClient>,
        prefix: &str,
        defaults: OperationalConfig,
    ) -> Result<Self> {
        defaults.validate()?;
        Ok(Self {
            node,
            prefixer: PathPrefixer::new(prefix),
            defaults,
        })
    }

    pub fn node(&self) -> &Arc<dyn NodeClient> {
        &self.node
    }

    pub fn prefixer(&self) -> &PathPrefixer {
        &self.prefixer
    }

    pub fn defaults(&self) -> &OperationalConfig {
        &self.defaults
    }

    // ==================== Existence ====================

    #[instrument(skip(self))]
    pub async fn file_exists(&self, path: &str) -> Result<bool> {
        let location = self.prefixer.location(path)?;
        Ok(self.try_stat(&location).await.is_some())
    }

    #[instrument(skip(self))]
    pub async fn directory_exists(&self, path: &str) -> Result<bool> {
        let location = self.prefixer.location(path)?;
        Ok(self
            .try_stat(&location)
            .await
            .is_some_and(|stat| stat.kind.is_dir()))
    }

    // ==================== Writes ====================

    /// Upload `contents` to `path` through the add/pin/copy/publish pipeline
    #[instrument(skip(self, contents, overrides))]
    pub async fn write(
        &self,
        path: &str,
        contents: impl Into<Bytes>,
        overrides: &ConfigOverride,
    ) -> Result<FileAttributes> {
        let location = self.prefixer.location(path)?;
        let config = self.defaults.merge(overrides);

        let result = UploadOrchestrator::new(self.node.as_ref())
            .upload(&location, contents.into(), &config)
            .await?;

        let mut attributes = FileAttributes::new(self.prefixer.relative(path)?)
            .with_size(result.size)
            .with_last_modified(result.timestamp)
            .with_hash(result.content_hash);
        if let Some(name) = result.ipns_name {
            attributes.extra_metadata.insert("ipns".to_string(), name);
        }
        Ok(attributes)
    }

    /// Collect `stream` and write it like [`StorageAdapter::write`]
    #[instrument(skip(self, stream, overrides))]
    pub async fn write_stream(
        &self,
        path: &str,
        mut stream: ByteStream,
        overrides: &ConfigOverride,
    ) -> Result<FileAttributes> {
        let location = self.prefixer.location(path)?;

        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| AdapterError::UploadFailed {
                location: location.clone(),
                source,
            })?;
            buffer.extend_from_slice(&chunk);
        }
        debug!(size = buffer.len(), "Collected upload stream");

        self.write(path, buffer.freeze(), overrides).await
    }

    /// `mkdir -p`
    #[instrument(skip(self))]
    pub async fn create_directory(&self, path: &str) -> Result<()> {
        let location = self.prefixer.location(path)?;
        self.node
            .mkdir(&location, true)
            .await
            .map_err(|e| AdapterError::from_node("create directory", &location, e))
    }

    // ==================== Reads ====================

    #[instrument(skip(self))]
    pub async fn read(&self, path: &str) -> Result<Bytes> {
        let location = self.prefixer.location(path)?;
        self.node
            .read(&location)
            .await
            .map_err(|e| AdapterError::from_node("read", &location, e))
    }

    #[instrument(skip(self))]
    pub async fn read_stream(&self, path: &str) -> Result<ByteStream> {
        let location = self.prefixer.location(path)?;
        self.node
            .read_stream(&location)
            .await
            .map_err(|e| AdapterError::from_node("read", &location, e))
    }

    /// Entries under `path`, recursing into subdirectories when `deep`.
    ///
    /// A directory the node cannot list contributes nothing; the base
    /// directory itself is never part of the result. A file at `path` lists
    /// as that single file.
    #[instrument(skip(self))]
    pub async fn list_contents(&self, path: &str, deep: bool) -> Result<Vec<StorageAttributes>> {
        let base = self.prefixer.relative(path)?;
        let now = chrono::Utc::now().timestamp();

        if let Some(stat) = self.try_stat(&self.prefixer.location(&base)?).await {
            if !stat.kind.is_dir() {
                return Ok(vec![file_listing(base, stat.size, stat.hash, now)]);
            }
        }

        let mut listing = Vec::new();
        let mut pending = VecDeque::from([base.clone()]);

        while let Some(dir) = pending.pop_front() {
            let location = self.prefixer.location(&dir)?;
            let entries = match self.node.ls(&location).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(location = %location, error = %e, "Unable to list directory, skipping");
                    continue;
                }
            };

            for entry in entries {
                let entry_path = join_logical(&dir, &entry.name);

                if entry.kind.is_dir() {
                    if entry_path == base {
                        continue;
                    }
                    if deep {
                        pending.push_back(entry_path.clone());
                    }
                    listing.push(StorageAttributes::Dir(
                        DirectoryAttributes::new(entry_path).with_last_modified(now),
                    ));
                } else {
                    listing.push(file_listing(entry_path, entry.size, entry.hash, now));
                }
            }
        }

        Ok(listing)
    }

    // ==================== Removal ====================

    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<()> {
        let location = self.prefixer.location(path)?;
        self.node
            .rm(&location, true)
            .await
            .map_err(|e| AdapterError::from_node("delete", &location, e))
    }

    #[instrument(skip(self))]
    pub async fn delete_directory(&self, path: &str) -> Result<()> {
        let location = self.prefixer.location(path)?;
        self.node
            .rm(&location, true)
            .await
            .map_err(|e| AdapterError::from_node("delete directory", &location, e))
    }

    // ==================== Metadata ====================

    /// Visibility cannot be changed; only checks that `path` exists
    #[instrument(skip(self))]
    pub async fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        self.stat(path, "set visibility of").await?;
        debug!(?visibility, "Visibility is not supported by MFS, ignoring");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn visibility(&self, path: &str) -> Result<FileAttributes> {
        self.stat(path, "retrieve visibility of").await?;
        Ok(FileAttributes::new(self.prefixer.relative(path)?).with_last_modified(now()))
    }

    #[instrument(skip(self))]
    pub async fn mime_type(&self, path: &str) -> Result<FileAttributes> {
        self.stat(path, "retrieve mime type of").await?;
        let relative = self.prefixer.relative(path)?;

        let mime_type = guess_mime_type(&relative)
            .ok_or_else(|| AdapterError::UnknownMimeType(relative.clone()))?;

        Ok(FileAttributes::new(relative)
            .with_last_modified(now())
            .with_mime_type(Some(mime_type)))
    }

    /// MFS keeps no modification times; reports the time of the call
    #[instrument(skip(self))]
    pub async fn last_modified(&self, path: &str) -> Result<FileAttributes> {
        let stat = self.stat(path, "retrieve last modified of").await?;

        Ok(FileAttributes::new(self.prefixer.relative(path)?)
            .with_size(Some(stat.size))
            .with_last_modified(now())
            .with_hash(stat.hash))
    }

    #[instrument(skip(self))]
    pub async fn file_size(&self, path: &str) -> Result<FileAttributes> {
        let stat = self.stat(path, "retrieve size of").await?;
        let relative = self.prefixer.relative(path)?;

        if stat.kind.is_dir() {
            return Err(AdapterError::IsDirectory(relative));
        }

        Ok(FileAttributes::new(relative)
            .with_size(Some(stat.size))
            .with_last_modified(now())
            .with_hash(stat.hash))
    }

    // ==================== Move / Copy ====================

    #[instrument(skip(self))]
    pub async fn move_to(&self, source: &str, destination: &str) -> Result<()> {
        let from = self.prefixer.location(source)?;
        let to = self.prefixer.location(destination)?;

        self.node
            .mv(&from, &to)
            .await
            .map_err(|e| AdapterError::from_node("move", &from, e))
    }

    /// Copy within MFS. An existing destination file is removed first when
    /// `auto_override` is on; otherwise the node refuses the copy. A non-empty
    /// directory is never replaced.
    #[instrument(skip(self, overrides))]
    pub async fn copy(
        &self,
        source: &str,
        destination: &str,
        overrides: &ConfigOverride,
    ) -> Result<()> {
        let from = self.prefixer.location(source)?;
        let to = self.prefixer.location(destination)?;
        let config = self.defaults.merge(overrides);

        if config.auto_override && self.try_stat(&to).await.is_some() {
            self.node
                .rm(&to, false)
                .await
                .map_err(|e| AdapterError::from_node("replace", &to, e))?;
        }

        self.node
            .cp(&from, &to)
            .await
            .map_err(|e| AdapterError::from_node("copy", &from, e))
    }

    // ==================== URLs ====================

    /// `ipfs://ipfs/<hash>[/<file>]` for the directory at `path`
    #[instrument(skip(self))]
    pub async fn get_url(&self, path: &str, file: Option<&str>) -> Result<String> {
        let stat = self.stat(path, "resolve URL of").await?;

        Ok(match file.map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
            Some(file) => format!("ipfs://ipfs/{}/{}", stat.hash, file),
            None => format!("ipfs://ipfs/{}", stat.hash),
        })
    }

    /// Gateway URL for `file` in the directory at `path`.
    ///
    /// Service and style come from the merged gateway options. An IPNS URL
    /// without a configured name publishes the directory first, which is only
    /// allowed when `auto_publish` is on.
    #[instrument(skip(self, overrides))]
    pub async fn get_gateway_url(
        &self,
        path: &str,
        file: Option<&str>,
        overrides: &ConfigOverride,
    ) -> Result<String> {
        let config = self.defaults.merge(overrides);
        let resolver = GatewayResolver::from_options(&config.gateway)?;
        let location = self.prefixer.location(path)?;

        // Fail with the resolver's own error before touching the node
        let available_name = config.ipns.as_deref().or(config.auto_publish.then_some(""));
        resolver.validate(&ResolutionRequest::new().cid("").ipns_name(available_name))?;

        let publish = resolver.requires_ipns_name() && config.ipns.is_none();
        if publish {
            ensure_nameable_key(&location, file.unwrap_or(""), config.key.as_deref())?;
        }
        let hash = if publish || resolver.requires_cid() {
            Some(self.stat(path, "resolve gateway URL of").await?.hash)
        } else {
            None
        };

        let published = match hash.as_deref() {
            Some(hash) if publish => Some(
                publish_hash(self.node.as_ref(), &location, file.unwrap_or(""), hash, &config)
                    .await?,
            ),
            _ => None,
        };

        let mut request = ResolutionRequest::new()
            .path(path)
            .ipns_name(published.as_deref().or(config.ipns.as_deref()));
        if let Some(file) = file {
            request = request.file(file);
        }
        if let Some(hash) = hash.as_deref() {
            request = request.cid(hash);
        }

        Ok(resolver.resolve(&request)?)
    }

    /// Publish the directory at `path` and resolve its gateway URL by name.
    ///
    /// Publishes under `key` when configured, otherwise under the key
    /// derived from `path` and `file`.
    #[instrument(skip(self, overrides))]
    pub async fn get_temporary_url(
        &self,
        path: &str,
        file: Option<&str>,
        overrides: &ConfigOverride,
    ) -> Result<String> {
        let config = self.defaults.merge(overrides);
        let resolver = GatewayResolver::from_options(&config.gateway)?;
        let location = self.prefixer.location(path)?;
        resolver.validate(&ResolutionRequest::new().cid("").ipns_name(Some("")))?;
        ensure_nameable_key(&location, file.unwrap_or(""), config.key.as_deref())?;

        let hash = self.stat(path, "resolve temporary URL of").await?.hash;
        let name =
            publish_hash(self.node.as_ref(), &location, file.unwrap_or(""), &hash, &config).await?;

        let mut request = ResolutionRequest::new()
            .path(path)
            .cid(&hash)
            .ipns_name(Some(&name));
        if let Some(file) = file {
            request = request.file(file);
        }

        Ok(resolver.resolve(&request)?)
    }

    // ==================== Internal ====================

    /// Stat that treats any failure as absence
    async fn try_stat(&self, location: &str) -> Option<NodeStat> {
        match self.node.stat(location).await {
            Ok(stat) => Some(stat),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                warn!(location, error = %e, "Stat failed, treating entry as missing");
                None
            }
        }
    }

    async fn stat(&self, path: &str, operation: &'static str) -> Result<NodeStat> {
        let location = self.prefixer.location(path)?;
        self.node
            .stat(&location)
            .await
            .map_err(|e| AdapterError::from_node(operation, &location, e))
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn join_logical(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

fn file_listing(path: String, size: u64, hash: String, now: i64) -> StorageAttributes {
    let mime_type = guess_mime_type(&path);
    StorageAttributes::File(
        FileAttributes::new(path)
            .with_size(Some(size))
            .with_last_modified(now)
            .with_mime_type(mime_type)
            .with_hash(hash),
    )
}

fn guess_mime_type(path: &str) -> Option<String> {
    mime_guess::from_path(path).first_raw().map(str::to_string)
}
