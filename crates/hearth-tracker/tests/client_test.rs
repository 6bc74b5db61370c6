//! Tests for RestHostingClient using wiremock

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hearth_tracker::{ClientError, HostingApi, RestHostingClient};

async fn setup() -> (MockServer, RestHostingClient) {
    let server = MockServer::start().await;
    let client = RestHostingClient::with_client(reqwest::Client::new(), server.uri(), None);
    (server, client)
}

fn repository_body() -> serde_json::Value {
    json!({
        "id": 4242,
        "full_name": "hearth-home/hearth",
        "description": "Smart home hub",
        "stargazers_count": 128,
        "watchers_count": 128,
        "forks_count": 17,
        "default_branch": "main",
        "updated_at": "2026-07-30T08:15:00Z"
    })
}

#[tokio::test]
async fn test_repository_fetch() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/repos/hearth-home/hearth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository_body()))
        .mount(&server)
        .await;

    let info = client.repository("hearth-home/hearth").await.unwrap();
    assert_eq!(info.id, 4242);
    assert_eq!(info.full_name, "hearth-home/hearth");
    assert_eq!(info.stargazers_count, 128);
    assert_eq!(info.default_branch, "main");
}

#[tokio::test]
async fn test_repository_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/repos/hearth-home/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let result = client.repository("hearth-home/missing").await;
    assert!(
        matches!(result, Err(ClientError::Status { status: 404, .. })),
        "expected Status error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_releases_empty_list() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/repos/hearth-home/hearth/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let releases = client.releases("hearth-home/hearth").await.unwrap();
    assert!(releases.is_empty());
}

#[tokio::test]
async fn test_releases_decodes_entries() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/repos/hearth-home/hearth/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 99,
            "name": "Summer release",
            "tag_name": "v0.3.0",
            "html_url": "https://example.invalid/releases/v0.3.0",
            "published_at": "2026-06-01T12:00:00Z",
            "prerelease": false
        }])))
        .mount(&server)
        .await;

    let releases = client.releases("hearth-home/hearth").await.unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].tag_name, "v0.3.0");
    assert_eq!(releases[0].name.as_deref(), Some("Summer release"));
}

#[tokio::test]
async fn test_token_sent_as_bearer() {
    let server = MockServer::start().await;
    let client = RestHostingClient::with_client(
        reqwest::Client::new(),
        server.uri(),
        Some("secret-token".to_string()),
    );

    Mock::given(method("GET"))
        .and(path("/repos/hearth-home/hearth"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository_body()))
        .mount(&server)
        .await;

    client.repository("hearth-home/hearth").await.unwrap();
}
