//! Integration tests for attachments, the body limit and static assets
mod common;

use axum::http::{header, StatusCode};
use common::{task_form, TestContext};
use taskdesk_api::config::DEFAULT_MAX_BODY_BYTES;

#[tokio::test]
async fn test_attachment_stored_and_downloaded_by_owner() {
    let ctx = TestContext::new().await;
    let alice = ctx.signed_in("alice").await;

    let form = task_form("Pay rent", "high").file("attachment", "lease.txt", b"twelve months");
    let created = ctx.create_task(&alice, &form).await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.text());

    let task = &ctx.list_tasks(&alice).await[0];
    assert_eq!(task["attachment_filename"], "lease.txt");

    let stored = std::fs::read(ctx.upload_dir().join("lease.txt")).unwrap();
    assert_eq!(stored, b"twelve months");

    let download = ctx.get("/uploads/lease.txt", Some(&alice)).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.body, b"twelve months");
    assert!(download
        .header(header::CONTENT_TYPE)
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_traversal_filename_is_sanitized() {
    let ctx = TestContext::new().await;
    let alice = ctx.signed_in("alice").await;

    let form = task_form("Read passwd", "low").file("attachment", "../../etc/passwd", b"root:x:0:0");
    let created = ctx.create_task(&alice, &form).await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.text());

    let task = &ctx.list_tasks(&alice).await[0];
    assert_eq!(task["attachment_filename"], "etc_passwd");

    let stored = ctx.upload_dir().join("etc_passwd");
    assert!(stored.starts_with(ctx.upload_dir()));
    assert_eq!(std::fs::read(stored).unwrap(), b"root:x:0:0");

    // only the upload directory's single entry exists
    let entries: Vec<_> = std::fs::read_dir(ctx.upload_dir()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_empty_file_part_means_no_attachment() {
    let ctx = TestContext::new().await;
    let alice = ctx.signed_in("alice").await;

    let form = task_form("Pay rent", "high").file("attachment", "", b"");
    let created = ctx.create_task(&alice, &form).await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.text());

    let task = &ctx.list_tasks(&alice).await[0];
    assert_eq!(task["attachment_filename"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_download_requires_owning_task() {
    let ctx = TestContext::new().await;
    let alice = ctx.signed_in("alice").await;
    let bob = ctx.signed_in("bob").await;

    let form = task_form("Pay rent", "high").file("attachment", "lease.txt", b"private");
    ctx.create_task(&alice, &form).await;

    let as_bob = ctx.get("/uploads/lease.txt", Some(&bob)).await;
    assert_eq!(as_bob.status, StatusCode::NOT_FOUND);
    assert_eq!(as_bob.json()["message"], "File not found");

    let missing = ctx.get("/uploads/nothing.txt", Some(&alice)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let escaped = ctx.get("/uploads/..%2Flease.txt", Some(&alice)).await;
    assert_eq!(escaped.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_task_attachment_is_no_longer_served() {
    let ctx = TestContext::new().await;
    let alice = ctx.signed_in("alice").await;

    let form = task_form("Pay rent", "high").file("attachment", "lease.txt", b"gone");
    ctx.create_task(&alice, &form).await;
    let id = ctx.list_tasks(&alice).await[0]["id"].as_i64().unwrap();

    ctx.delete(&format!("/api/tasks/{id}"), Some(&alice)).await;

    let download = ctx.get("/uploads/lease.txt", Some(&alice)).await;
    assert_eq!(download.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let ctx = TestContext::new().await;
    let alice = ctx.signed_in("alice").await;

    let payload = vec![b'x'; DEFAULT_MAX_BODY_BYTES + 1];
    let form = task_form("Huge", "low").file("attachment", "huge.bin", &payload);
    let response = ctx.create_task(&alice, &form).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json()["error"], "payload_too_large");
    assert_eq!(ctx.task_count().await, 0);
    assert!(!ctx.upload_dir().join("huge.bin").exists());
}

#[tokio::test]
async fn test_body_limit_follows_configuration() {
    let ctx = TestContext::with_body_limit(1024).await;
    let alice = ctx.signed_in("alice").await;

    let small = task_form("Small", "low").file("attachment", "small.txt", &[b'a'; 100]);
    assert_eq!(ctx.create_task(&alice, &small).await.status, StatusCode::CREATED);

    let large = task_form("Large", "low").file("attachment", "large.txt", &[b'a'; 4096]);
    assert_eq!(
        ctx.create_task(&alice, &large).await.status,
        StatusCode::PAYLOAD_TOO_LARGE
    );
    assert_eq!(ctx.task_count().await, 1);
}

#[tokio::test]
async fn test_static_assets_are_public() {
    let ctx = TestContext::new().await;

    let css = ctx.get("/static/css/app.css", None).await;
    assert_eq!(css.status, StatusCode::OK);
    assert!(css.header(header::CONTENT_TYPE).unwrap().starts_with("text/css"));

    let missing = ctx.get("/static/css/missing.css", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
