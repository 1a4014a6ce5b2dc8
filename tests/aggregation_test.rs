//! Tag aggregation against an in-process registry

mod common;

use axum::http::StatusCode;
use common::{CREATED_UNIX, LAYER_DIGEST, LAYER_SIZE, MockRegistry};
use docker_registry_manager::{ManagerConfig, ManagerError, Repository, TagStatus};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_two_tags_are_aggregated_with_sizes_and_timestamps() {
    let mock = Arc::new(MockRegistry::new().with_repository("test1", &["latest", "v1"]));
    let uri = common::serve(mock).await;

    let manager = common::manager();
    let registry = manager.add_registry(&uri).await.unwrap();
    let mut tags = manager
        .tags(registry, &Repository::new("test1"))
        .await
        .unwrap();
    tags.sort_by(|a, b| a.name.cmp(&b.name));

    let names: Vec<&str> = tags.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(names, vec!["latest", "v1"]);
    for tag in &tags {
        assert_eq!(tag.status, TagStatus::Ok);
        assert_eq!(tag.size_int, LAYER_SIZE as u64);
        assert_eq!(tag.size, "1.00 KB");
        assert_eq!(tag.layers, 1);
        assert_eq!(tag.updated_time_unix, CREATED_UNIX);
        assert!(tag.time_ago.ends_with("ago"));
    }
}

#[tokio::test]
async fn test_failing_manifests_still_yield_one_record_per_tag() {
    let mock = Arc::new(
        MockRegistry::new()
            .with_repository("test1", &["a", "b", "c"])
            .failing_manifests(),
    );
    let uri = common::serve(mock).await;

    let manager = common::manager();
    let registry = manager.add_registry(&uri).await.unwrap();
    let tags = manager
        .tags(registry, &Repository::new("test1"))
        .await
        .unwrap();

    assert_eq!(tags.len(), 3);
    for tag in &tags {
        assert!(matches!(tag.status, TagStatus::Degraded(_)));
        assert_eq!(tag.size_int, 0);
        assert_eq!(tag.layers, 0);
        assert_eq!(tag.updated_time_unix, 0);
        assert_eq!(tag.time_ago, "never");
    }
}

#[tokio::test]
async fn test_empty_tag_list_yields_no_records() {
    let mock = Arc::new(MockRegistry::new().with_repository("empty", &[]));
    let uri = common::serve(mock).await;

    let manager = common::manager();
    let registry = manager.add_registry(&uri).await.unwrap();
    let tags = manager
        .tags(registry, &Repository::new("empty"))
        .await
        .unwrap();
    assert!(tags.is_empty());
}

#[tokio::test]
async fn test_unknown_repository_fails_the_tag_list() {
    let mock = Arc::new(MockRegistry::new().with_repository("test1", &["latest"]));
    let uri = common::serve(mock).await;

    let manager = common::manager();
    let registry = manager.add_registry(&uri).await.unwrap();
    let err = manager
        .tags(registry, &Repository::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::TagListUnavailable { .. }));
}

#[tokio::test]
async fn test_image_resolves_layer_sizes_and_history() {
    let mock = Arc::new(MockRegistry::new().with_repository("test1", &["latest"]));
    let uri = common::serve(mock).await;

    let manager = common::manager();
    let registry = manager.add_registry(&uri).await.unwrap();
    let repository = Repository::new("test1");

    let manifest = manager.manifest(&registry, &repository, "latest").await.unwrap();
    assert_eq!(manifest.fs_layers[0].size, None);

    let image = manager.image(&registry, &repository, "latest").await.unwrap();
    assert_eq!(image.fs_layers[0].size, Some(LAYER_SIZE as u64));
    assert_eq!(image.total_layer_size(), LAYER_SIZE as u64);
    let v1 = &image.history[0].v1_compatibility;
    assert_eq!(v1.id_short, "e1d9c3e");
    assert!(v1.container_config.cmd_clean.contains("CMD"));
    assert!(!image.contains_v1_size);
}

#[tokio::test]
async fn test_missing_blob_counts_zero_bytes_and_degrades_tag() {
    let mock = Arc::new(
        MockRegistry::new()
            .with_repository("test1", &["latest"])
            .blob_status(StatusCode::NOT_FOUND),
    );
    let uri = common::serve(mock).await;

    let manager = common::manager();
    let registry = manager.add_registry(&uri).await.unwrap();
    let tags = manager
        .tags(registry, &Repository::new("test1"))
        .await
        .unwrap();

    assert_eq!(tags.len(), 1);
    let tag = &tags[0];
    assert_eq!(tag.size_int, 0);
    assert_eq!(tag.layers, 1);
    assert_eq!(tag.updated_time_unix, CREATED_UNIX);
    match &tag.status {
        TagStatus::Degraded(reason) => {
            assert!(reason.contains(LAYER_DIGEST), "reason: {}", reason);
            assert!(reason.contains("HTTP 404"), "reason: {}", reason);
        }
        TagStatus::Ok => panic!("tag with a missing blob reported as ok"),
    }
}

#[tokio::test]
async fn test_missing_blob_leaves_image_layer_at_zero() {
    let mock = Arc::new(
        MockRegistry::new()
            .with_repository("test1", &["latest"])
            .blob_status(StatusCode::NOT_FOUND),
    );
    let uri = common::serve(mock).await;

    let manager = common::manager();
    let registry = manager.add_registry(&uri).await.unwrap();
    let image = manager
        .image(&registry, &Repository::new("test1"), "latest")
        .await
        .unwrap();
    assert_eq!(image.fs_layers[0].size, Some(0));
}

#[tokio::test]
async fn test_blob_transport_failure_degrades_every_tag_but_keeps_the_batch() {
    let mock = Arc::new(
        MockRegistry::new()
            .with_repository("test1", &["latest", "v1"])
            .blob_delay(Duration::from_secs(5)),
    );
    let uri = common::serve(mock).await;

    let config = ManagerConfig::default().with_timeout(Some(Duration::from_millis(500)));
    let manager = common::manager_with(config);
    let registry = manager.add_registry(&uri).await.unwrap();
    let tags = manager
        .tags(registry, &Repository::new("test1"))
        .await
        .unwrap();

    assert_eq!(tags.len(), 2);
    for tag in &tags {
        assert!(matches!(tag.status, TagStatus::Degraded(_)));
        assert_eq!(tag.size_int, 0);
        assert_eq!(tag.layers, 1);
        assert_eq!(tag.updated_time_unix, CREATED_UNIX);
    }
}

#[tokio::test]
async fn test_malformed_tag_list_is_a_decode_error() {
    let mock = Arc::new(
        MockRegistry::new()
            .with_repository("test1", &["latest"])
            .malformed_tag_list(),
    );
    let uri = common::serve(mock).await;

    let manager = common::manager();
    let registry = manager.add_registry(&uri).await.unwrap();
    let err = manager
        .tags(registry, &Repository::new("test1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::Decode { .. }));
}
