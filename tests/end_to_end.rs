//! End-to-end tests for the MFS adapter
//!
//! These tests drive the full stack (adapter, upload pipeline, key
//! resolution, gateway resolver) against the in-memory node, and the
//! write path against a mocked Kubo RPC endpoint.

use bytes::Bytes;
use ipfs_mfs::adapter::{
    GatewayConfig, ResolutionRequest, StorageAttributes, ValidationError,
};
use ipfs_mfs::node::Capability;
use ipfs_mfs::{
    AdapterError, ConfigOverride, GatewayResolver, HttpNodeClient, HttpNodeConfig, MemoryNode,
    NodeClient, OperationalConfig, StorageAdapter,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn memory_adapter() -> (Arc<MemoryNode>, StorageAdapter) {
    let node = Arc::new(MemoryNode::new());
    let adapter = StorageAdapter::new(node.clone(), "", OperationalConfig::default()).unwrap();
    (node, adapter)
}

fn ipns(style: &str) -> ConfigOverride {
    ConfigOverride::new().gateway_service("ipns").gateway_style(style)
}

/// Write with defaults, then read back
#[test_log::test(tokio::test)]
async fn test_write_then_read() {
    let (node, adapter) = memory_adapter();

    let attributes = adapter
        .write("/some/deep/nested/path.txt", "contents", &ConfigOverride::new())
        .await
        .unwrap();

    assert_eq!(attributes.path, "some/deep/nested/path.txt");
    assert_eq!(attributes.file_size, Some(8));
    assert_eq!(
        adapter.read("/some/deep/nested/path.txt").await.unwrap(),
        Bytes::from("contents")
    );
    assert!(adapter.file_exists("/some/deep/nested/path.txt").await.unwrap());
    assert_eq!(node.pins(), vec![attributes.hash().unwrap().to_string()]);
}

/// Path-style IPFS gateway URL
#[test]
fn test_path_gateway_url() {
    let resolver = GatewayResolver::new(GatewayConfig::new("ipfs", "path").unwrap().with_host("ipfs.io"));

    let url = resolver
        .resolve(&ResolutionRequest::new().cid("Qm123").file("path.txt"))
        .unwrap();

    assert_eq!(url, "https://ipfs.io/ipfs/Qm123/path.txt");
}

/// DNSLink gateway URL on the preferred domain never touches the node
#[tokio::test]
async fn test_dnslink_gateway_url() {
    let (node, adapter) = memory_adapter();
    let overrides = ipns("dnslink").gateway_domain("my-ipfs-domain.com");

    let url = adapter
        .get_gateway_url("/some/deep/nested/", Some("path.txt"), &overrides)
        .await
        .unwrap();

    assert_eq!(url, "https://my-ipfs-domain.com/some/deep/nested/path.txt");
    assert!(node.calls().is_empty());
}

/// IPNS path URL without a name or auto publish fails before any node call
#[tokio::test]
async fn test_ipns_gateway_url_requires_identifier() {
    let (node, adapter) = memory_adapter();

    let err = adapter
        .get_gateway_url("/some/deep/nested", Some("path.txt"), &ipns("path"))
        .await
        .unwrap_err();

    assert!(err.is_missing_identifier());
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_dnslink_without_domain_fails_before_io() {
    let (node, adapter) = memory_adapter();

    let err = adapter
        .get_gateway_url("dir", None, &ConfigOverride::new().gateway_style("dnslink"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AdapterError::Validation(ValidationError::MissingDomain { .. })
    ));
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_ipfs_gateway_urls_use_directory_hash() {
    let (node, adapter) = memory_adapter();
    adapter
        .write("site/index.html", "<html/>", &ConfigOverride::new())
        .await
        .unwrap();
    let hash = node.stat("/site").await.unwrap().hash;

    let path_url = adapter
        .get_gateway_url("site", Some("index.html"), &ConfigOverride::new())
        .await
        .unwrap();
    let subdomain_url = adapter
        .get_gateway_url(
            "site",
            Some("index.html"),
            &ConfigOverride::new().gateway_style("subdomain").gateway_url("dweb.link"),
        )
        .await
        .unwrap();

    assert_eq!(path_url, format!("https://ipfs.io/ipfs/{}/index.html", hash));
    assert_eq!(subdomain_url, format!("https://{}.ipfs.dweb.link/index.html", hash));
}

#[tokio::test]
async fn test_ipns_gateway_url_publishes_on_demand() {
    let (node, adapter) = memory_adapter();
    adapter
        .write("/some/deep/nested/path.txt", "contents", &ConfigOverride::new().auto_publish(true))
        .await
        .unwrap();
    let dir_hash = node.stat("/some/deep/nested").await.unwrap().hash;

    let url = adapter
        .get_gateway_url(
            "/some/deep/nested",
            Some("path.txt"),
            &ipns("path").auto_publish(true),
        )
        .await
        .unwrap();

    let name = url
        .strip_prefix("https://ipfs.io/ipns/")
        .and_then(|rest| rest.strip_suffix("/path.txt"))
        .unwrap();
    assert_eq!(node.resolve_name(name), Some(format!("/ipfs/{}", dir_hash)));

    // Upload and URL publish share one derived key
    assert_eq!(node.call_count(Capability::KeyGen), 1);
    let keys = node.key_list().await.unwrap();
    assert!(keys.iter().any(|k| k.name == "somedeepnestedpathtxt"));
}

#[tokio::test]
async fn test_configured_ipns_name_skips_publish() {
    let (node, adapter) = memory_adapter();

    let url = adapter
        .get_gateway_url("docs", Some("a.txt"), &ipns("subdomain").ipns("k51name"))
        .await
        .unwrap();

    assert_eq!(url, "https://k51name.ipns.ipfs.io/a.txt");
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_temporary_url() {
    let (node, adapter) = memory_adapter();
    adapter
        .write("share/report.pdf", "pdf", &ConfigOverride::new())
        .await
        .unwrap();

    let url = adapter
        .get_temporary_url(
            "share",
            Some("report.pdf"),
            &ipns("subdomain").lifetime("1h"),
        )
        .await
        .unwrap();

    let name = url
        .strip_prefix("https://")
        .and_then(|rest| rest.strip_suffix(".ipns.ipfs.io/report.pdf"))
        .unwrap();
    let dir_hash = node.stat("/share").await.unwrap().hash;
    assert_eq!(node.resolve_name(name), Some(format!("/ipfs/{}", dir_hash)));
}

#[tokio::test]
async fn test_temporary_url_with_explicit_key() {
    let (node, adapter) = memory_adapter();
    adapter.create_directory("share").await.unwrap();

    adapter
        .get_temporary_url("share", None, &ipns("path").key("self"))
        .await
        .unwrap();

    assert_eq!(node.call_count(Capability::KeyGen), 0);
    assert_eq!(node.call_count(Capability::Publish), 1);
}

#[tokio::test]
async fn test_list_contents() {
    let (_node, adapter) = memory_adapter();
    for path in ["a/b.txt", "a/c/d.txt", "a/c/e/f.json"] {
        adapter.write(path, "x", &ConfigOverride::new()).await.unwrap();
    }

    let shallow = adapter.list_contents("a", false).await.unwrap();
    let mut shallow_paths: Vec<_> = shallow.iter().map(|e| e.path().to_string()).collect();
    shallow_paths.sort();
    assert_eq!(shallow_paths, vec!["a/b.txt", "a/c"]);

    let deep = adapter.list_contents("/a/", true).await.unwrap();
    let mut deep_paths: Vec<_> = deep.iter().map(|e| e.path().to_string()).collect();
    deep_paths.sort();
    assert_eq!(
        deep_paths,
        vec!["a/b.txt", "a/c", "a/c/d.txt", "a/c/e", "a/c/e/f.json"]
    );

    let json_entry = deep.iter().find(|e| e.path() == "a/c/e/f.json").unwrap();
    match json_entry {
        StorageAttributes::File(file) => {
            assert_eq!(file.mime_type.as_deref(), Some("application/json"));
            assert!(file.hash().is_some());
        }
        StorageAttributes::Dir(_) => panic!("expected a file"),
    }
}

#[tokio::test]
async fn test_list_missing_directory_is_empty() {
    let (_node, adapter) = memory_adapter();
    assert!(adapter.list_contents("nowhere", true).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_move_and_delete() {
    let (_node, adapter) = memory_adapter();
    adapter.write("a.txt", "a", &ConfigOverride::new()).await.unwrap();

    adapter.move_to("a.txt", "b.txt").await.unwrap();
    assert!(!adapter.file_exists("a.txt").await.unwrap());
    assert_eq!(adapter.read("b.txt").await.unwrap(), Bytes::from("a"));

    adapter.delete("b.txt").await.unwrap();
    assert!(adapter.read("b.txt").await.unwrap_err().is_not_found());

    adapter.create_directory("d/e").await.unwrap();
    adapter.delete_directory("d").await.unwrap();
    assert!(!adapter.directory_exists("d").await.unwrap());
}

#[tokio::test]
async fn test_read_stream() {
    let (_node, adapter) = memory_adapter();
    adapter.write("s.txt", "streamed", &ConfigOverride::new()).await.unwrap();

    let stream = adapter.read_stream("s.txt").await.unwrap();
    let chunks: Vec<Bytes> = futures::TryStreamExt::try_collect(stream).await.unwrap();

    assert_eq!(chunks.concat(), b"streamed".to_vec());
}

#[tokio::test]
async fn test_prefixed_adapters_are_isolated() {
    let node = Arc::new(MemoryNode::new());
    let alice = StorageAdapter::new(node.clone(), "alice", OperationalConfig::default()).unwrap();
    let bob = StorageAdapter::new(node.clone(), "bob", OperationalConfig::default()).unwrap();

    alice.write("notes.txt", "mine", &ConfigOverride::new()).await.unwrap();

    assert!(alice.file_exists("notes.txt").await.unwrap());
    assert!(!bob.file_exists("notes.txt").await.unwrap());
    assert!(bob.read("../alice/notes.txt").await.unwrap_err().is_validation());
}

/// Write path against a mocked Kubo RPC endpoint
#[tokio::test]
async fn test_write_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/add"))
        .and(query_param("pin", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Name": "a.txt",
            "Hash": "QmA",
            "Size": "13"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v0/files/stat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "Message": "file does not exist",
            "Code": 0,
            "Type": "error"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v0/files/mkdir"))
        .and(query_param("arg", "/docs"))
        .and(query_param("parents", "true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v0/files/cp"))
        .and(query_param("arg", "/ipfs/QmA"))
        .and(query_param("arg", "/docs/a.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let node = HttpNodeClient::new(HttpNodeConfig::with_url(server.uri())).unwrap();
    let adapter = StorageAdapter::new(Arc::new(node), "", OperationalConfig::default()).unwrap();

    let attributes = adapter
        .write("docs/a.txt", "hello, world!", &ConfigOverride::new())
        .await
        .unwrap();

    assert_eq!(attributes.hash(), Some("QmA"));
    assert_eq!(attributes.file_size, Some(13));
}

#[tokio::test]
async fn test_http_failure_is_upload_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/add"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "Message": "blockstore full",
            "Code": 0,
            "Type": "error"
        })))
        .mount(&server)
        .await;

    let node = HttpNodeClient::new(HttpNodeConfig::with_url(server.uri())).unwrap();
    let adapter = StorageAdapter::new(Arc::new(node), "", OperationalConfig::default()).unwrap();

    let err = adapter
        .write("a.txt", "x", &ConfigOverride::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::UploadFailed { ref location, .. } if location == "/a.txt"));
    assert!(err.to_string().contains("blockstore full"));
}
