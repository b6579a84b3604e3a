//! In-memory node for testing and dry runs
//!
//! Mirrors the Kubo behaviors the adapter depends on: `files/cp` refuses an
//! occupied destination, `files/rm` needs `recursive` for directories and
//! `files/mkdir` without `parents` needs an existing parent.

use crate::cid_utils::{cid_from_ipfs_path, create_cid, parse_cid, CidCodec};
use crate::{
    AddEntry, AddedObject, ByteStream, EntryKind, KeyInfo, NodeClient, NodeEntry, NodeError,
    NodeStat, PublishRequest, Published, Result,
};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Node capabilities, used to journal calls and inject failures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    Add,
    Stat,
    Read,
    Ls,
    Mv,
    Cp,
    Rm,
    Mkdir,
    Publish,
    KeyGen,
    KeyList,
    RemotePinAdd,
}

#[derive(Clone, Debug)]
enum MfsNode {
    File { cid: String, size: u64 },
    Dir,
}

#[derive(Default)]
struct NodeState {
    /// Absolute MFS path -> node; "/" is implicit
    mfs: BTreeMap<String, MfsNode>,
    /// Key name -> key id
    keys: BTreeMap<String, String>,
    /// IPNS name -> published path
    records: HashMap<String, String>,
    pins: BTreeSet<String>,
    remote_services: HashSet<String>,
    remote_pins: Vec<(String, String)>,
}

/// An in-memory IPFS node
#[derive(Clone)]
pub struct MemoryNode {
    blocks: Arc<DashMap<String, Bytes>>,
    state: Arc<RwLock<NodeState>>,
    calls: Arc<Mutex<Vec<Capability>>>,
    failures: Arc<Mutex<HashSet<Capability>>>,
}

impl Default for MemoryNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNode {
    /// Create an empty node whose keystore holds the `self` key
    pub fn new() -> Self {
        let mut state = NodeState::default();
        state.keys.insert("self".to_string(), key_id("self"));

        Self {
            blocks: Arc::new(DashMap::new()),
            state: Arc::new(RwLock::new(state)),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Register a remote pinning service by name
    pub fn with_remote_service(self, name: impl Into<String>) -> Self {
        self.state.write().remote_services.insert(name.into());
        self
    }

    /// Make every call of `capability` fail until cleared
    pub fn inject_failure(&self, capability: Capability) {
        self.failures.lock().insert(capability);
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<Capability> {
        self.calls.lock().clone()
    }

    /// Number of calls made for one capability
    pub fn call_count(&self, capability: Capability) -> usize {
        self.calls.lock().iter().filter(|c| **c == capability).count()
    }

    /// Forget the call journal
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// CIDs pinned locally
    pub fn pins(&self) -> Vec<String> {
        self.state.read().pins.iter().cloned().collect()
    }

    /// (service, CID) pairs pinned remotely
    pub fn remote_pins(&self) -> Vec<(String, String)> {
        self.state.read().remote_pins.clone()
    }

    /// Path currently published under an IPNS name
    pub fn resolve_name(&self, name: &str) -> Option<String> {
        self.state.read().records.get(name).cloned()
    }

    /// Whether the blockstore holds a CID
    pub fn has_block(&self, cid: &str) -> bool {
        self.blocks.contains_key(cid)
    }

    fn record(&self, capability: Capability) -> Result<()> {
        self.calls.lock().push(capability);
        if self.failures.lock().contains(&capability) {
            return Err(NodeError::Api(format!("injected failure for {:?}", capability)));
        }
        Ok(())
    }

    fn stat_locked(state: &NodeState, path: &str) -> Result<NodeStat> {
        match lookup(state, path)? {
            MfsNode::File { cid, size } => Ok(NodeStat {
                hash: cid,
                size,
                cumulative_size: size,
                kind: EntryKind::File,
            }),
            MfsNode::Dir => Ok(NodeStat {
                hash: dir_hash(state, path),
                size: 0,
                cumulative_size: dir_size(state, path),
                kind: EntryKind::Dir,
            }),
        }
    }
}

fn key_id(name: &str) -> String {
    create_cid(name.as_bytes(), CidCodec::Libp2pKey).to_string()
}

fn not_found(path: &str) -> NodeError {
    NodeError::NotFound(format!("{}: file does not exist", path))
}

/// Normalize an absolute MFS path: collapse separators, drop the trailing one
fn normalize(path: &str) -> Result<String> {
    if !path.starts_with('/') {
        return Err(NodeError::Api(format!("paths must start with a leading slash: {}", path)));
    }
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    Ok(format!("/{}", segments.join("/")))
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn child_prefix(path: &str) -> String {
    if path == "/" {
        "/".to_string()
    } else {
        format!("{}/", path)
    }
}

fn lookup(state: &NodeState, path: &str) -> Result<MfsNode> {
    if path == "/" {
        return Ok(MfsNode::Dir);
    }
    state.mfs.get(path).cloned().ok_or_else(|| not_found(path))
}

fn is_dir(state: &NodeState, path: &str) -> bool {
    matches!(lookup(state, path), Ok(MfsNode::Dir))
}

/// Direct children of a directory, sorted by name
fn children(state: &NodeState, path: &str) -> Vec<(String, MfsNode)> {
    let prefix = child_prefix(path);
    state
        .mfs
        .range(prefix.clone()..)
        .take_while(|(k, _)| k.starts_with(&prefix))
        .filter(|(k, _)| !k[prefix.len()..].contains('/'))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Every path strictly below a directory
fn descendants(state: &NodeState, path: &str) -> Vec<String> {
    let prefix = child_prefix(path);
    state
        .mfs
        .range(prefix.clone()..)
        .take_while(|(k, _)| k.starts_with(&prefix))
        .map(|(k, _)| k.clone())
        .collect()
}

fn dir_hash(state: &NodeState, path: &str) -> String {
    let mut manifest = String::new();
    for (child, node) in children(state, path) {
        let hash = match node {
            MfsNode::File { cid, .. } => cid,
            MfsNode::Dir => dir_hash(state, &child),
        };
        manifest.push_str(name_of(&child));
        manifest.push(':');
        manifest.push_str(&hash);
        manifest.push('\n');
    }
    create_cid(manifest.as_bytes(), CidCodec::DagPb).to_string()
}

fn dir_size(state: &NodeState, path: &str) -> u64 {
    descendants(state, path)
        .iter()
        .filter_map(|p| match state.mfs.get(p) {
            Some(MfsNode::File { size, .. }) => Some(*size),
            _ => None,
        })
        .sum()
}

fn ensure_free_destination(state: &NodeState, to: &str) -> Result<()> {
    if to == "/" || state.mfs.contains_key(to) {
        return Err(NodeError::Api(format!(
            "cp: cannot put node in path {}: directory already has entry by that name",
            to
        )));
    }
    let parent = parent_of(to);
    match lookup(state, parent) {
        Ok(MfsNode::Dir) => Ok(()),
        Ok(MfsNode::File { .. }) => Err(NodeError::Api(format!("{} is not a directory", parent))),
        Err(_) => Err(not_found(parent)),
    }
}

/// Snapshot of a subtree, keyed relative to its root ("" is the root itself)
fn subtree(state: &NodeState, path: &str) -> Result<Vec<(String, MfsNode)>> {
    let root = lookup(state, path)?;
    let mut nodes = vec![(String::new(), root)];
    for descendant in descendants(state, path) {
        if let Some(node) = state.mfs.get(&descendant) {
            nodes.push((descendant[path.len()..].to_string(), node.clone()));
        }
    }
    Ok(nodes)
}

#[async_trait]
impl NodeClient for MemoryNode {
    async fn add(&self, entry: AddEntry, pin: bool) -> Result<AddedObject> {
        self.record(Capability::Add)?;

        let hash = create_cid(&entry.data, CidCodec::Raw).to_string();
        let size = entry.data.len() as u64;
        self.blocks.insert(hash.clone(), entry.data);
        if pin {
            self.state.write().pins.insert(hash.clone());
        }

        Ok(AddedObject {
            name: entry.name,
            hash,
            size: Some(size),
        })
    }

    async fn stat(&self, path: &str) -> Result<NodeStat> {
        self.record(Capability::Stat)?;
        let path = normalize(path)?;
        let state = self.state.read();
        Self::stat_locked(&state, &path)
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        self.record(Capability::Read)?;
        let path = normalize(path)?;
        let state = self.state.read();
        match lookup(&state, &path)? {
            MfsNode::File { cid, .. } => self
                .blocks
                .get(&cid)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| NodeError::NotFound(format!("block {} not found", cid))),
            MfsNode::Dir => Err(NodeError::Api(format!("{} is a directory", path))),
        }
    }

    async fn read_stream(&self, path: &str) -> Result<ByteStream> {
        let data = self.read(path).await?;
        Ok(Box::pin(futures::stream::once(async move {
            Ok::<_, NodeError>(data)
        })))
    }

    async fn ls(&self, path: &str) -> Result<Vec<NodeEntry>> {
        self.record(Capability::Ls)?;
        let path = normalize(path)?;
        let state = self.state.read();

        let node = lookup(&state, &path)?;
        if let MfsNode::File { cid, size } = node {
            return Ok(vec![NodeEntry {
                name: name_of(&path).to_string(),
                kind: EntryKind::File,
                size,
                hash: cid,
            }]);
        }

        Ok(children(&state, &path)
            .into_iter()
            .map(|(child, node)| match node {
                MfsNode::File { cid, size } => NodeEntry {
                    name: name_of(&child).to_string(),
                    kind: EntryKind::File,
                    size,
                    hash: cid,
                },
                MfsNode::Dir => NodeEntry {
                    name: name_of(&child).to_string(),
                    kind: EntryKind::Dir,
                    size: 0,
                    hash: dir_hash(&state, &child),
                },
            })
            .collect())
    }

    async fn mv(&self, from: &str, to: &str) -> Result<()> {
        self.record(Capability::Mv)?;
        let (from, to) = (normalize(from)?, normalize(to)?);
        let mut state = self.state.write();

        if from == "/" {
            return Err(NodeError::Api("cannot move the root directory".to_string()));
        }
        let nodes = subtree(&state, &from)?;
        if to.starts_with(&child_prefix(&from)) {
            return Err(NodeError::Api(format!("cannot move {} into itself", from)));
        }
        ensure_free_destination(&state, &to)?;

        state.mfs.remove(&from);
        for descendant in descendants(&state, &from) {
            state.mfs.remove(&descendant);
        }
        for (relative, node) in nodes {
            state.mfs.insert(format!("{}{}", to, relative), node);
        }
        Ok(())
    }

    async fn cp(&self, from: &str, to: &str) -> Result<()> {
        self.record(Capability::Cp)?;
        let to = normalize(to)?;
        let mut state = self.state.write();

        let nodes = match cid_from_ipfs_path(from) {
            Some(cid) => {
                let cid = parse_cid(cid)?.to_string();
                let size = self
                    .blocks
                    .get(&cid)
                    .map(|entry| entry.value().len() as u64)
                    .ok_or_else(|| NodeError::NotFound(format!("block {} not found", cid)))?;
                vec![(String::new(), MfsNode::File { cid, size })]
            }
            None => subtree(&state, &normalize(from)?)?,
        };
        ensure_free_destination(&state, &to)?;

        for (relative, node) in nodes {
            state.mfs.insert(format!("{}{}", to, relative), node);
        }
        Ok(())
    }

    async fn rm(&self, path: &str, recursive: bool) -> Result<()> {
        self.record(Capability::Rm)?;
        let path = normalize(path)?;
        let mut state = self.state.write();

        if path == "/" {
            return Err(NodeError::Api("cannot delete root".to_string()));
        }
        if let MfsNode::Dir = lookup(&state, &path)? {
            if !recursive {
                return Err(NodeError::Api(format!(
                    "{} is a directory, use -r to remove directories",
                    path
                )));
            }
            for descendant in descendants(&state, &path) {
                state.mfs.remove(&descendant);
            }
        }
        state.mfs.remove(&path);
        Ok(())
    }

    async fn mkdir(&self, path: &str, parents: bool) -> Result<()> {
        self.record(Capability::Mkdir)?;
        let path = normalize(path)?;
        let mut state = self.state.write();

        match lookup(&state, &path) {
            Ok(MfsNode::Dir) if parents => return Ok(()),
            Ok(_) => return Err(NodeError::Api(format!("{}: file already exists", path))),
            Err(_) => {}
        }

        if !parents {
            let parent = parent_of(&path);
            if !is_dir(&state, parent) {
                return Err(not_found(parent));
            }
            state.mfs.insert(path, MfsNode::Dir);
            return Ok(());
        }

        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            match state.mfs.get(&current) {
                Some(MfsNode::Dir) => {}
                Some(MfsNode::File { .. }) => {
                    return Err(NodeError::Api(format!("{} is not a directory", current)));
                }
                None => {
                    state.mfs.insert(current.clone(), MfsNode::Dir);
                }
            }
        }
        Ok(())
    }

    async fn publish(&self, request: PublishRequest) -> Result<Published> {
        self.record(Capability::Publish)?;
        let mut state = self.state.write();

        let name = state.keys.get(&request.key).cloned().ok_or_else(|| {
            NodeError::Api(format!("no key by the given name was found: {}", request.key))
        })?;
        state.records.insert(name.clone(), request.path.clone());

        Ok(Published {
            name,
            value: request.path,
        })
    }

    async fn key_gen(&self, name: &str) -> Result<KeyInfo> {
        self.record(Capability::KeyGen)?;
        let mut state = self.state.write();

        if state.keys.contains_key(name) {
            return Err(NodeError::Api(format!("key with name '{}' already exists", name)));
        }
        let id = key_id(name);
        state.keys.insert(name.to_string(), id.clone());

        Ok(KeyInfo {
            name: name.to_string(),
            id,
        })
    }

    async fn key_list(&self) -> Result<Vec<KeyInfo>> {
        self.record(Capability::KeyList)?;
        Ok(self
            .state
            .read()
            .keys
            .iter()
            .map(|(name, id)| KeyInfo {
                name: name.clone(),
                id: id.clone(),
            })
            .collect())
    }

    async fn remote_pin_add(&self, service: &str, cid: &str) -> Result<()> {
        self.record(Capability::RemotePinAdd)?;
        let mut state = self.state.write();

        if !state.remote_services.contains(service) {
            return Err(NodeError::Api(format!("service not found: {}", service)));
        }
        state.remote_pins.push((service.to_string(), cid.to_string()));
        Ok(())
    }
}
