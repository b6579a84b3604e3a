//! Kubo RPC request/response shapes against a mock node

use mfs_node::{
    AddEntry, EntryKind, HttpNodeClient, HttpNodeConfig, NodeClient, NodeError, PublishRequest,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> HttpNodeClient {
    HttpNodeClient::new(HttpNodeConfig::with_url(server.uri())).unwrap()
}

#[tokio::test]
async fn connect_verifies_node_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ID": "12D3Koo"})))
        .expect(1)
        .mount(&server)
        .await;

    HttpNodeClient::connect(HttpNodeConfig::with_url(server.uri()))
        .await
        .unwrap();
}

#[tokio::test]
async fn add_sends_multipart_and_pin_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/add"))
        .and(query_param("pin", "false"))
        .and(body_string_contains("contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Name": "path.txt",
            "Hash": "QmHash",
            "Size": "16"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let node = client_for(&server).await;
    let added = node
        .add(AddEntry::new("path.txt", "contents"), false)
        .await
        .unwrap();

    assert_eq!(added.hash, "QmHash");
    assert_eq!(added.size, Some(16));
}

#[tokio::test]
async fn stat_normalizes_string_type_tag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/files/stat"))
        .and(query_param("arg", "/some/dir"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Hash": "QmDir",
            "Size": 0,
            "CumulativeSize": 120,
            "Blocks": 2,
            "Type": "directory"
        })))
        .mount(&server)
        .await;

    let stat = client_for(&server).await.stat("/some/dir").await.unwrap();

    assert_eq!(stat.hash, "QmDir");
    assert_eq!(stat.kind, EntryKind::Dir);
}

#[tokio::test]
async fn missing_entry_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/files/stat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "Message": "file does not exist",
            "Code": 0,
            "Type": "error"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).await.stat("/missing").await.unwrap_err();

    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[tokio::test]
async fn other_failures_map_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/files/cp"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "Message": "cp: cannot put node in path /a: directory already has entry by that name",
            "Code": 0,
            "Type": "error"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .cp("/ipfs/QmHash", "/a")
        .await
        .unwrap_err();

    assert!(matches!(err, NodeError::Api(ref message) if message.contains("already has entry")));
}

#[tokio::test]
async fn ls_accepts_integer_type_tags_and_null_entries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/files/ls"))
        .and(query_param("arg", "/dir"))
        .and(query_param("long", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Entries": [
                {"Name": "nested", "Type": 1, "Size": 0, "Hash": "QmNested"},
                {"Name": "file.txt", "Type": 0, "Size": 8, "Hash": "QmFile"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v0/files/ls"))
        .and(query_param("arg", "/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Entries": null})))
        .mount(&server)
        .await;

    let node = client_for(&server).await;
    let entries = node.ls("/dir").await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, EntryKind::Dir);
    assert_eq!(entries[1].kind, EntryKind::File);
    assert_eq!(entries[1].size, 8);
    assert!(node.ls("/empty").await.unwrap().is_empty());
}

#[tokio::test]
async fn publish_passes_key_and_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/name/publish"))
        .and(query_param("arg", "/ipfs/QmHash"))
        .and(query_param("key", "somedeepnestedpathtxt"))
        .and(query_param("lifetime", "60s"))
        .and(query_param("offline", "true"))
        .and(query_param("allow-offline", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Name": "k51qzi5uqu5d",
            "Value": "/ipfs/QmHash"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let published = client_for(&server)
        .await
        .publish(
            PublishRequest::new("/ipfs/QmHash", "somedeepnestedpathtxt")
                .with_lifetime("60s")
                .with_offline(true, true),
        )
        .await
        .unwrap();

    assert_eq!(published.name, "k51qzi5uqu5d");
}

#[tokio::test]
async fn keys_and_remote_pins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/key/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Keys": [{"Name": "self", "Id": "k51self"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v0/key/gen"))
        .and(query_param("arg", "mykey"))
        .and(query_param("type", "ed25519"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Name": "mykey",
            "Id": "k51mykey"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v0/pin/remote/add"))
        .and(query_param("arg", "QmHash"))
        .and(query_param("service", "pinata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Cid": "QmHash", "Status": "queued"})))
        .expect(1)
        .mount(&server)
        .await;

    let node = client_for(&server).await;

    assert_eq!(node.key_list().await.unwrap()[0].name, "self");
    assert_eq!(node.key_gen("mykey").await.unwrap().id, "k51mykey");
    node.remote_pin_add("pinata", "QmHash").await.unwrap();
}

#[tokio::test]
async fn read_returns_body_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/files/read"))
        .and(query_param("arg", "/file.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"contents".to_vec()))
        .mount(&server)
        .await;

    let data = client_for(&server).await.read("/file.txt").await.unwrap();

    assert_eq!(data.as_ref(), b"contents");
}

#[tokio::test]
async fn unparseable_json_is_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/files/stat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"Hash\": "))
        .mount(&server)
        .await;

    let err = client_for(&server).await.stat("/a").await.unwrap_err();

    assert!(matches!(err, NodeError::Serialization(_)));
}
