//! Shared fixtures for the integration tests: a mock identity provider and
//! a mock Graph API on one wiremock server.

#![allow(dead_code)]

use graph_file_search::config::Settings;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT: &str = "tenant";
pub const USER_TOKEN: &str = "user-token";
pub const GRAPH_TOKEN: &str = "graph-token";

/// Settings pointing both upstreams at `server`
pub fn settings(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.auth.tenant_id = TENANT.to_string();
    settings.auth.client_id = "client".to_string();
    settings.auth.client_secret = "secret".to_string();
    settings.auth.authority_host = server.uri();
    settings.graph.base_url = graph_base(server);
    settings
}

pub fn graph_base(server: &MockServer) -> String {
    format!("{}/v1.0", server.uri())
}

pub fn token_path() -> String {
    format!("/{}/oauth2/v2.0/token", TENANT)
}

/// Token endpoint that grants [`GRAPH_TOKEN`] for [`USER_TOKEN`]
pub async fn mount_token_grant(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(token_path()))
        .and(body_string_contains(format!("assertion={}", USER_TOKEN)))
        .and(body_string_contains("requested_token_use=on_behalf_of"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": GRAPH_TOKEN
        })))
        .mount(server)
        .await;
}

/// Token endpoint that rejects every assertion
pub async fn mount_token_rejection(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(token_path()))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "AADSTS50013: Assertion failed signature validation."
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Search endpoint answering with `body`
pub async fn mount_search(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/v1.0/search/query"))
        .and(header("authorization", format!("Bearer {}", GRAPH_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Search response with one container holding `hits`
pub fn search_body(hits: Vec<Value>) -> Value {
    json!({
        "value": [{
            "searchTerms": ["budget"],
            "hitsContainers": [{
                "total": hits.len(),
                "moreResultsAvailable": false,
                "hits": hits
            }]
        }]
    })
}

/// A drive item hit
pub fn drive_hit(id: &str, drive_id: &str, name: &str) -> Value {
    json!({
        "hitId": id,
        "rank": 1,
        "summary": "",
        "resource": {
            "@odata.type": "#microsoft.graph.driveItem",
            "id": id,
            "name": name,
            "parentReference": {"driveId": drive_id, "id": "parent"}
        }
    })
}

/// Content and metadata endpoints for one item
pub async fn mount_item(server: &MockServer, drive_id: &str, id: &str, name: &str, mime: &str, bytes: Vec<u8>) {
    let item_path = format!("/v1.0/drives/{}/items/{}", drive_id, id);

    Mock::given(method("GET"))
        .and(path(format!("{}/content", item_path)))
        .and(header("authorization", format!("Bearer {}", GRAPH_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(item_path))
        .and(header("authorization", format!("Bearer {}", GRAPH_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "name": name,
            "size": 0,
            "file": {"mimeType": mime}
        })))
        .mount(server)
        .await;
}

/// Content endpoint for one item that fails with a Graph error
pub async fn mount_missing_content(server: &MockServer, drive_id: &str, id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/drives/{}/items/{}/content", drive_id, id)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "itemNotFound", "message": "The resource could not be found."}
        })))
        .mount(server)
        .await;
}
