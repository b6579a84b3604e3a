//! IPNS key selection for publishing

use crate::error::{AdapterError, Result, ValidationError};
use mfs_node::NodeClient;
use tracing::{debug, info};

/// Deterministic key name for a resource: the prefixed path and the file
/// name concatenated, reduced to `[a-z0-9-]`
pub fn derive_key_name(prefixed_path: &str, file: &str) -> String {
    format!("{}{}", prefixed_path, file)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Key to publish `file` under `prefixed_path` with.
///
/// An explicit key is used as-is and must already be in the keystore.
/// A derived key is generated the first time it is needed, so every
/// publish of the same resource reuses one IPNS identity.
pub async fn resolve_key(
    node: &dyn NodeClient,
    prefixed_path: &str,
    file: &str,
    explicit: Option<&str>,
) -> Result<String> {
    if let Some(key) = explicit.filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    let name = derive_key_name(prefixed_path, file);
    if name.is_empty() {
        return Err(ValidationError::UnnamedKey(format!("{}{}", prefixed_path, file)).into());
    }

    let keys = node
        .key_list()
        .await
        .map_err(|e| AdapterError::from_node("list keys for", prefixed_path, e))?;
    if keys.iter().any(|k| k.name == name) {
        debug!(key = %name, "Reusing IPNS key");
        return Ok(name);
    }

    node.key_gen(&name)
        .await
        .map_err(|e| AdapterError::from_node("generate key for", prefixed_path, e))?;
    info!(key = %name, "Generated IPNS key");

    Ok(name)
}
