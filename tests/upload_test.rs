mod common;

use common::{
    API_KEY, error_json, file_record_json, progress_recorder, request_count, slot_json,
    test_client,
};
use rust_file_client::{
    CancellationToken, ClientError, ErrorKind, ProcessingContext, ProcessingState, UploadRequest,
};
use serde_json::json;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn png_payload(len: usize) -> Vec<u8> {
    let mut data = PNG_HEADER.to_vec();
    data.resize(len, 0xAB);
    data
}

async fn mount_slot(server: &MockServer, upload_url: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/upload/request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(slot_json("file_1", upload_url)))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_record(server: &MockServer, state: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v1/files/file_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_record_json("file_1", state)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_upload_flow_progress_sequence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/upload/request"))
        .and(body_partial_json(json!({
            "fileType": "image/png",
            "fileName": "receipt.png",
            "fileSizeBytes": 512 * 1024,
            "context": "receipt",
            "tags": { "source": "test" },
            "webhookUrl": "https://hooks.example.com/files"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(slot_json("file_1", "/upload/file_1")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/file_1"))
        .and(header("authorization", format!("Bearer {}", API_KEY).as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount_record(&server, "completed").await;

    let (client, _clock) = test_client(&server);
    let (callback, seen) = progress_recorder();
    let tags = HashMap::from([("source".to_string(), "test".to_string())]);

    let request = UploadRequest::new(
        png_payload(512 * 1024),
        "receipt.png",
        "image/png",
        ProcessingContext::Receipt,
    )
    .with_tags(tags)
    .with_webhook("https://hooks.example.com/files")
    .on_progress(callback);

    let record = client.upload(request).await.unwrap();
    assert_eq!(record.id, "file_1");
    assert_eq!(record.processing_state, ProcessingState::Completed);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.first(), Some(&10));
    assert_eq!(seen.iter().filter(|p| **p == 10).count(), 1);
    assert_eq!(seen.iter().filter(|p| **p == 90).count(), 1);
    assert_eq!(seen[seen.len() - 2], 90);
    assert_eq!(seen.last(), Some(&100));

    let intermediate = &seen[1..seen.len() - 2];
    assert!(!intermediate.is_empty());
    assert!(intermediate.iter().all(|p| *p > 10 && *p < 90));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_disallowed_type_fails_before_network() {
    let server = MockServer::start().await;
    let (client, _clock) = test_client(&server);

    let request = UploadRequest::new(
        b"MZ\x90\x00".to_vec(),
        "setup.exe",
        "application/x-msdownload",
        ProcessingContext::Attachment,
    );
    let err = client.upload(request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidFileType);
    assert_eq!(err.status(), None);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_quota_error_propagates_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/upload/request"))
        .respond_with(ResponseTemplate::new(403).set_body_json(error_json(
            "QUOTA_EXCEEDED",
            "Storage quota exceeded",
            json!({ "quotaBytes": 1073741824u64, "usedBytes": 1073000000u64 }),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _clock) = test_client(&server);
    let request = UploadRequest::new(
        png_payload(1024),
        "big.png",
        "image/png",
        ProcessingContext::General,
    );
    let err = client.upload(request).await.unwrap_err();

    match err {
        ClientError::QuotaExceeded {
            quota_bytes,
            used_bytes,
            status,
            ..
        } => {
            assert_eq!(quota_bytes, 1073741824);
            assert_eq!(used_bytes, 1073000000);
            assert_eq!(status, Some(403));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_transfer_is_not_retried() {
    let server = MockServer::start().await;
    mount_slot(&server, "/upload/file_1").await;
    Mock::given(method("PUT"))
        .and(path("/upload/file_1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (client, clock) = test_client(&server);
    let request = UploadRequest::new(
        png_payload(2048),
        "scan.png",
        "image/png",
        ProcessingContext::Document,
    );
    let err = client.upload(request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upload);
    assert_eq!(err.status(), Some(500));
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_third_party_destination_gets_no_credentials() {
    let server = MockServer::start().await;
    let storage = MockServer::start().await;
    mount_slot(&server, &format!("{}/bucket/file_1?sig=xyz", storage.uri())).await;
    Mock::given(method("PUT"))
        .and(path("/bucket/file_1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&storage)
        .await;
    mount_record(&server, "completed").await;

    let (client, _clock) = test_client(&server);
    let request = UploadRequest::new(
        png_payload(4096),
        "avatar.png",
        "image/png",
        ProcessingContext::ProfileImage,
    );
    client.upload(request).await.unwrap();

    let requests = storage.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_without_wait_fetches_once() {
    let server = MockServer::start().await;
    mount_slot(&server, "/upload/file_1").await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    mount_record(&server, "pending").await;

    let (client, clock) = test_client(&server);
    let request = UploadRequest::new(
        png_payload(100),
        "receipt.png",
        "image/png",
        ProcessingContext::Receipt,
    )
    .without_wait();
    let record = client.upload(request).await.unwrap();

    assert_eq!(record.processing_state, ProcessingState::Pending);
    assert!(clock.sleeps().is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.iter().filter(|r| r.method.as_str() == "GET").count(), 1);
}

#[tokio::test]
async fn test_cancelled_upload_makes_no_calls() {
    let server = MockServer::start().await;
    let token = CancellationToken::new();
    token.cancel();

    let (client, _clock) = test_client(&server);
    let request = UploadRequest::new(
        png_payload(100),
        "receipt.png",
        "image/png",
        ProcessingContext::Receipt,
    )
    .with_cancellation(token);
    let err = client.upload(request).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_cancel_during_transfer_skips_processing_wait() {
    let server = MockServer::start().await;
    mount_slot(&server, "/upload/file_1").await;
    Mock::given(method("PUT"))
        .and(path("/upload/file_1"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;
    mount_record(&server, "completed").await;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let (client, clock) = test_client(&server);
    let (callback, seen) = progress_recorder();
    let request = UploadRequest::new(
        png_payload(2048),
        "receipt.png",
        "image/png",
        ProcessingContext::Receipt,
    )
    .with_cancellation(token)
    .on_progress(callback);

    let started = Instant::now();
    let err = client.upload(request).await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(clock.sleeps().is_empty());
    assert!(!seen.lock().unwrap().contains(&90));

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|r| !(r.method.as_str() == "GET" && r.url.path() == "/api/v1/files/file_1"))
    );
}
