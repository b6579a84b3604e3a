//! Kubo RPC client for the node capabilities

use crate::{
    AddEntry, AddedObject, ByteStream, KeyInfo, NodeClient, NodeEntry, NodeError, NodeStat,
    PublishRequest, Published, Result,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{multipart, Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

/// Configuration for the Kubo RPC connection
#[derive(Clone, Debug)]
pub struct HttpNodeConfig {
    /// RPC API URL (e.g., "http://localhost:5001")
    pub api_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for HttpNodeConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5001".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl HttpNodeConfig {
    /// Create with a custom API URL
    pub fn with_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Node client speaking the Kubo RPC API
#[derive(Clone)]
pub struct HttpNodeClient {
    client: Client,
    config: HttpNodeConfig,
}

impl HttpNodeClient {
    /// Create a client without contacting the node
    pub fn new(mut config: HttpNodeConfig) -> Result<Self> {
        url::Url::parse(&config.api_url)
            .map_err(|e| NodeError::Configuration(format!("invalid API URL {}: {}", config.api_url, e)))?;
        config.api_url = config.api_url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NodeError::Connection(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a client and verify the node answers
    pub async fn connect(config: HttpNodeConfig) -> Result<Self> {
        let node = Self::new(config)?;
        node.verify_connection().await?;
        Ok(node)
    }

    /// Get the configuration
    pub fn config(&self) -> &HttpNodeConfig {
        &self.config
    }

    /// Verify connection to the node
    pub async fn verify_connection(&self) -> Result<()> {
        self.rpc("id", &[])
            .await
            .map_err(|e| NodeError::Connection(format!("Failed to connect to IPFS: {}", e)))?;
        Ok(())
    }

    async fn rpc(&self, command: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = format!("{}/api/v0/{}", self.config.api_url, command);
        let response = self.client.post(&url).query(query).send().await?;
        ensure_success(command, response).await
    }

    async fn rpc_json<T: serde::de::DeserializeOwned>(
        &self,
        command: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let body = self.rpc(command, query).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(command, body = %body, "Unparseable RPC response");
            NodeError::from(e)
        })
    }
}

/// Error body returned by Kubo on non-2xx responses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiErrorBody {
    message: String,
}

async fn ensure_success(command: &str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    tracing::debug!(command, %status, message = %message, "IPFS RPC call failed");

    if is_not_found_message(&message) {
        return Err(NodeError::NotFound(message));
    }
    Err(NodeError::Api(format!("{} failed ({}): {}", command, status, message)))
}

fn is_not_found_message(message: &str) -> bool {
    message.contains("does not exist")
        || message.contains("no link named")
        || message.contains("not found")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    name: String,
    hash: String,
    #[serde(default)]
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LsResponse {
    #[serde(default)]
    entries: Option<Vec<NodeEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyListResponse {
    #[serde(default)]
    keys: Vec<KeyInfo>,
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    #[instrument(skip(self, entry), fields(name = %entry.name, size = entry.data.len()))]
    async fn add(&self, entry: AddEntry, pin: bool) -> Result<AddedObject> {
        let url = format!("{}/api/v0/add", self.config.api_url);

        let part = multipart::Part::bytes(entry.data.to_vec())
            .file_name(entry.name)
            .mime_str("application/octet-stream")
            .map_err(|e| NodeError::Api(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .query(&[("pin", pin.to_string())])
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success("add", response).await?;

        let added: AddResponse = response
            .json()
            .await
            .map_err(|e| NodeError::Api(e.to_string()))?;

        tracing::debug!(hash = %added.hash, pin, "Added content to IPFS");

        Ok(AddedObject {
            name: added.name,
            hash: added.hash,
            size: added.size.and_then(|s| s.parse().ok()),
        })
    }

    #[instrument(skip(self))]
    async fn stat(&self, path: &str) -> Result<NodeStat> {
        self.rpc_json("files/stat", &[("arg", path.to_string())]).await
    }

    #[instrument(skip(self))]
    async fn read(&self, path: &str) -> Result<Bytes> {
        let response = self.rpc("files/read", &[("arg", path.to_string())]).await?;
        response
            .bytes()
            .await
            .map_err(|e| NodeError::Api(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn read_stream(&self, path: &str) -> Result<ByteStream> {
        let response = self.rpc("files/read", &[("arg", path.to_string())]).await?;
        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(NodeError::from)),
        ))
    }

    #[instrument(skip(self))]
    async fn ls(&self, path: &str) -> Result<Vec<NodeEntry>> {
        let listing: LsResponse = self
            .rpc_json(
                "files/ls",
                &[
                    ("arg", path.to_string()),
                    ("long", "true".to_string()),
                    ("U", "true".to_string()),
                ],
            )
            .await?;
        Ok(listing.entries.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn mv(&self, from: &str, to: &str) -> Result<()> {
        self.rpc("files/mv", &[("arg", from.to_string()), ("arg", to.to_string())])
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn cp(&self, from: &str, to: &str) -> Result<()> {
        self.rpc("files/cp", &[("arg", from.to_string()), ("arg", to.to_string())])
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn rm(&self, path: &str, recursive: bool) -> Result<()> {
        self.rpc(
            "files/rm",
            &[("arg", path.to_string()), ("recursive", recursive.to_string())],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mkdir(&self, path: &str, parents: bool) -> Result<()> {
        self.rpc(
            "files/mkdir",
            &[("arg", path.to_string()), ("parents", parents.to_string())],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(path = %request.path, key = %request.key))]
    async fn publish(&self, request: PublishRequest) -> Result<Published> {
        let published: Published = self
            .rpc_json(
                "name/publish",
                &[
                    ("arg", request.path),
                    ("key", request.key),
                    ("lifetime", request.lifetime),
                    ("offline", request.offline.to_string()),
                    ("allow-offline", request.allow_offline.to_string()),
                ],
            )
            .await?;

        tracing::debug!(name = %published.name, value = %published.value, "Published IPNS record");
        Ok(published)
    }

    #[instrument(skip(self))]
    async fn key_gen(&self, name: &str) -> Result<KeyInfo> {
        self.rpc_json(
            "key/gen",
            &[("arg", name.to_string()), ("type", "ed25519".to_string())],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn key_list(&self) -> Result<Vec<KeyInfo>> {
        let listing: KeyListResponse = self.rpc_json("key/list", &[]).await?;
        Ok(listing.keys)
    }

    #[instrument(skip(self))]
    async fn remote_pin_add(&self, service: &str, cid: &str) -> Result<()> {
        self.rpc(
            "pin/remote/add",
            &[("arg", cid.to_string()), ("service", service.to_string())],
        )
        .await?;
        Ok(())
    }
}
