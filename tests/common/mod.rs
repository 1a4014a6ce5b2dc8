//! In-process registry used by the integration tests
//!
//! Serves a small Docker Registry v2 surface on an ephemeral port: API root,
//! catalog, tag lists, schema 1 manifests, blob HEAD and manifest DELETE.
//! Each route can be switched to an error status or a malformed body.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use docker_registry_manager::{Logger, ManagerConfig, RegistryManager};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const LAYER_SIZE: usize = 1024;
pub const LAYER_DIGEST: &str =
    "sha256:a3ed95caeb02ffe68cdd9fd84406680ae93d633cb16422d00e8a7c22955b46d4";
pub const MANIFEST_DIGEST: &str =
    "sha256:fea8895f450959fa676bcc1df0611ea93823a735a01205fd8622846041d0c7cf";
/// `created` of the single history entry, 2016-06-15T18:28:30Z
pub const CREATED_UNIX: i64 = 1466015310;

#[derive(Default)]
pub struct MockRegistry {
    pub tags: HashMap<String, Vec<String>>,
    pub fail_manifests: bool,
    pub digest: Option<String>,
    pub deletes: AtomicUsize,
    pub root_status: Option<StatusCode>,
    pub catalog_status: Option<StatusCode>,
    pub malformed_catalog: bool,
    pub malformed_tag_list: bool,
    pub blob_status: Option<StatusCode>,
    pub blob_delay: Option<Duration>,
    pub delete_status: Option<StatusCode>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            digest: Some(MANIFEST_DIGEST.to_string()),
            ..Self::default()
        }
    }

    pub fn with_repository(mut self, name: &str, tags: &[&str]) -> Self {
        self.tags.insert(
            name.to_string(),
            tags.iter().map(|tag| tag.to_string()).collect(),
        );
        self
    }

    pub fn failing_manifests(mut self) -> Self {
        self.fail_manifests = true;
        self
    }

    pub fn without_digest(mut self) -> Self {
        self.digest = None;
        self
    }

    pub fn root_status(mut self, status: StatusCode) -> Self {
        self.root_status = Some(status);
        self
    }

    pub fn catalog_status(mut self, status: StatusCode) -> Self {
        self.catalog_status = Some(status);
        self
    }

    pub fn malformed_catalog(mut self) -> Self {
        self.malformed_catalog = true;
        self
    }

    pub fn malformed_tag_list(mut self) -> Self {
        self.malformed_tag_list = true;
        self
    }

    pub fn blob_status(mut self, status: StatusCode) -> Self {
        self.blob_status = Some(status);
        self
    }

    /// Stall every blob HEAD, used to trip the client timeout
    pub fn blob_delay(mut self, delay: Duration) -> Self {
        self.blob_delay = Some(delay);
        self
    }

    pub fn delete_status(mut self, status: StatusCode) -> Self {
        self.delete_status = Some(status);
        self
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

/// Bind the mock on 127.0.0.1 and return its registry URI
pub async fn serve(mock: Arc<MockRegistry>) -> String {
    let app = Router::new()
        .route("/v2/", get(api_root))
        .route("/v2/_catalog", get(catalog))
        .route("/v2/:repo/tags/list", get(tag_list))
        .route(
            "/v2/:repo/manifests/:reference",
            get(manifest).head(manifest_head).delete(manifest_delete),
        )
        .route("/v2/:repo/blobs/:digest", get(blob).head(blob_head))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", addr.port())
}

pub fn manager() -> RegistryManager {
    manager_with(ManagerConfig::default())
}

pub fn manager_with(config: ManagerConfig) -> RegistryManager {
    RegistryManager::new(&config, Logger::new_quiet()).unwrap()
}

fn malformed(body: &'static str) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

pub fn schema1_manifest(repository: &str, tag: &str) -> serde_json::Value {
    let v1 = json!({
        "id": "e1d9c3e5d8a6b3c1f3a9e4b2c7d8f0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7",
        "created": "2016-06-15T18:28:30.000000000Z",
        "container_config": { "Cmd": ["/bin/sh -c #(nop) CMD [\"/bin/sh\"]"] },
        "docker_version": "1.11.1",
        "architecture": "amd64",
        "os": "linux",
        "Size": 0
    });
    json!({
        "schemaVersion": 1,
        "name": repository,
        "tag": tag,
        "architecture": "amd64",
        "fsLayers": [{ "blobSum": LAYER_DIGEST }],
        "history": [{ "v1Compatibility": v1.to_string() }]
    })
}

async fn api_root(State(mock): State<Arc<MockRegistry>>) -> Response {
    match mock.root_status {
        Some(status) => status.into_response(),
        None => Json(json!({})).into_response(),
    }
}

async fn catalog(State(mock): State<Arc<MockRegistry>>) -> Response {
    if let Some(status) = mock.catalog_status {
        return status.into_response();
    }
    if mock.malformed_catalog {
        return malformed(r#"{"repositories": "test1"}"#);
    }
    let mut repositories: Vec<&String> = mock.tags.keys().collect();
    repositories.sort();
    Json(json!({ "repositories": repositories })).into_response()
}

async fn tag_list(
    State(mock): State<Arc<MockRegistry>>,
    Path(repo): Path<String>,
) -> Response {
    if mock.malformed_tag_list {
        return malformed(r#"{"name": "test1", "tags": ["latest""#);
    }
    match mock.tags.get(&repo) {
        Some(tags) => Json(json!({ "name": repo, "tags": tags })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn manifest(
    State(mock): State<Arc<MockRegistry>>,
    Path((repo, reference)): Path<(String, String)>,
) -> Response {
    if mock.fail_manifests {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(schema1_manifest(&repo, &reference)).into_response()
}

async fn manifest_head(State(mock): State<Arc<MockRegistry>>) -> Response {
    let mut response = StatusCode::OK.into_response();
    if let Some(digest) = &mock.digest {
        response
            .headers_mut()
            .insert("Docker-Content-Digest", HeaderValue::from_str(digest).unwrap());
    }
    response
}

async fn manifest_delete(State(mock): State<Arc<MockRegistry>>) -> StatusCode {
    mock.deletes.fetch_add(1, Ordering::SeqCst);
    mock.delete_status.unwrap_or(StatusCode::ACCEPTED)
}

async fn blob() -> Vec<u8> {
    vec![0u8; LAYER_SIZE]
}

async fn blob_head(State(mock): State<Arc<MockRegistry>>) -> Response {
    if let Some(delay) = mock.blob_delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(status) = mock.blob_status {
        return status.into_response();
    }
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_LENGTH, LAYER_SIZE)
        .body(Body::empty())
        .unwrap()
}
