#![allow(dead_code)]

use rust_file_client::utils::clock::ManualClock;
use rust_file_client::{ClientConfig, FileClient};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

pub const API_KEY: &str = "sk_test_123";

pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig::new(API_KEY)
        .unwrap()
        .with_base_url(base_url)
        .unwrap()
}

pub fn test_client(server: &MockServer) -> (FileClient, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let client = FileClient::with_clock(test_config(&server.uri()), clock.clone()).unwrap();
    (client, clock)
}

pub fn file_record_json(id: &str, state: &str) -> Value {
    json!({
        "id": id,
        "url": format!("https://cdn.rustfile.cloud/{}", id),
        "originalName": "receipt.png",
        "fileType": "image/png",
        "sizeBytes": 4096,
        "context": "receipt",
        "tags": { "source": "test" },
        "metadata": {},
        "processingState": state,
        "createdAt": "2026-03-01T12:00:00Z"
    })
}

pub fn slot_json(file_id: &str, upload_url: &str) -> Value {
    json!({
        "fileId": file_id,
        "uploadUrl": upload_url,
        "expiresAt": "2026-03-01T12:15:00Z",
        "constraints": {
            "maxSizeBytes": 104857600,
            "allowedTypes": ["image/png", "application/pdf"]
        }
    })
}

pub fn error_json(code: &str, message: &str, details: Value) -> Value {
    json!({ "error": { "code": code, "message": message, "details": details } })
}

/// Progress callback that records every value it receives.
pub fn progress_recorder() -> (impl Fn(u8) + Send + Sync + 'static, Arc<Mutex<Vec<u8>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (move |p: u8| sink.lock().unwrap().push(p), seen)
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}
