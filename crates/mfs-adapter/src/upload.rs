//! Write pipeline: add, pin, link into MFS, publish
//!
//! Steps run strictly in order and each is switched by its own flag.
//! A failing step aborts the upload; earlier steps are not undone.

use crate::attributes::UploadResult;
use crate::config::OperationalConfig;
use crate::error::{AdapterError, Result, ValidationError};
use crate::keys::{derive_key_name, resolve_key};
use bytes::Bytes;
use mfs_node::{AddEntry, EntryKind, NodeClient, NodeError, PublishRequest};
use tracing::{debug, instrument, warn};

/// Runs uploads against one node
pub struct UploadOrchestrator<'a> {
    node: &'a dyn NodeClient,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(node: &'a dyn NodeClient) -> Self {
        Self { node }
    }

    /// Upload `contents` to the absolute MFS path `location`
    #[instrument(skip(self, contents, config), fields(size = contents.len()))]
    pub async fn upload(
        &self,
        location: &str,
        contents: Bytes,
        config: &OperationalConfig,
    ) -> Result<UploadResult> {
        let failed = |source: NodeError| AdapterError::UploadFailed {
            location: location.to_string(),
            source,
        };
        let (parent, file) = split_location(location);
        if config.auto_publish {
            ensure_nameable_key(parent, file, config.key.as_deref())?;
        }

        let remote_service = config
            .auto_pin
            .then(|| config.pin_options.remote_service())
            .flatten();
        let pin_locally = config.auto_pin && remote_service.is_none();

        let added = self
            .node
            .add(AddEntry::new(file, contents), pin_locally)
            .await
            .map_err(failed)?;
        debug!(hash = %added.hash, pinned = pin_locally, "Added content");

        if let Some(service) = remote_service {
            self.node
                .remote_pin_add(service, &added.hash)
                .await
                .map_err(failed)?;
            debug!(hash = %added.hash, service, "Pinned content remotely");
        }

        if config.auto_copy {
            self.mirror(location, parent, &added.hash, config.auto_override)
                .await
                .map_err(failed)?;
        }

        let ipns_name = if config.auto_publish {
            let name = self
                .publish(parent, file, &added.hash, config)
                .await
                .map_err(|e| e.into_upload_failure(location))?;
            Some(name)
        } else {
            None
        };

        Ok(UploadResult {
            path: location.to_string(),
            content_hash: added.hash,
            size: added.size,
            entry_type: EntryKind::File,
            timestamp: chrono::Utc::now().timestamp(),
            ipns_name,
        })
    }

    /// Link `/ipfs/<hash>` at `location`.
    ///
    /// An occupied location is replaced when `replace` is set and left alone
    /// otherwise; the latter is not an error. Only files are replaced, a
    /// non-empty directory at `location` fails the step.
    async fn mirror(
        &self,
        location: &str,
        parent: &str,
        hash: &str,
        replace: bool,
    ) -> std::result::Result<(), NodeError> {
        if self.node.stat(location).await.is_ok() {
            if !replace {
                warn!(location, "Entry exists and override is disabled, skipping copy");
                return Ok(());
            }
            self.node.rm(location, false).await?;
        }

        if parent != "/" {
            self.node.mkdir(parent, true).await?;
        }
        self.node.cp(&format!("/ipfs/{}", hash), location).await?;
        debug!(location, hash, "Linked content into MFS");
        Ok(())
    }

    async fn publish(
        &self,
        parent: &str,
        file: &str,
        hash: &str,
        config: &OperationalConfig,
    ) -> Result<String> {
        publish_hash(self.node, parent, file, hash, config).await
    }
}

/// Publish `/ipfs/<hash>` under the key for (`prefixed_path`, `file`)
pub(crate) async fn publish_hash(
    node: &dyn NodeClient,
    prefixed_path: &str,
    file: &str,
    hash: &str,
    config: &OperationalConfig,
) -> Result<String> {
    let key = resolve_key(node, prefixed_path, file, config.key.as_deref()).await?;
    let options = &config.publish_options;

    let published = node
        .publish(
            PublishRequest::new(format!("/ipfs/{}", hash), key)
                .with_lifetime(options.lifetime.clone())
                .with_offline(options.offline, options.allow_offline),
        )
        .await
        .map_err(|e| AdapterError::from_node("publish", prefixed_path, e))?;

    debug!(name = %published.name, hash, "Published to IPNS");
    Ok(published.name)
}

/// Fail before any node call when publishing would need a key that
/// cannot be named
pub(crate) fn ensure_nameable_key(
    prefixed_path: &str,
    file: &str,
    explicit: Option<&str>,
) -> Result<()> {
    let explicit = explicit.is_some_and(|key| !key.is_empty());
    if !explicit && derive_key_name(prefixed_path, file).is_empty() {
        return Err(ValidationError::UnnamedKey(format!("{}{}", prefixed_path, file)).into());
    }
    Ok(())
}

/// Split an absolute MFS path into its parent directory and file name
pub(crate) fn split_location(location: &str) -> (&str, &str) {
    match location.rfind('/') {
        Some(0) => ("/", &location[1..]),
        Some(idx) => (&location[..idx], &location[idx + 1..]),
        None => ("/", location),
    }
}
