use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Receives upload progress as a percentage in `0..=100`.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Server-side pipeline applied to a file once its bytes have landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingContext {
    General,
    Document,
    Receipt,
    Invoice,
    ProfileImage,
    Attachment,
    /// A context added server-side after this client was built. Only produced by decoding.
    #[serde(other)]
    Unknown,
}

impl ProcessingContext {
    /// Contexts a caller can request; `Unknown` is receive-only.
    pub const ALL: [ProcessingContext; 6] = [
        Self::General,
        Self::Document,
        Self::Receipt,
        Self::Invoice,
        Self::ProfileImage,
        Self::Attachment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Document => "document",
            Self::Receipt => "receipt",
            Self::Invoice => "invoice",
            Self::ProfileImage => "profile_image",
            Self::Attachment => "attachment",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProcessingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProcessingContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|ctx| ctx.as_str() == s)
            .ok_or_else(|| format!("unknown processing context '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Pending,
    Processing,
    Completed,
    Failed,
    /// A state this client does not know about yet; treated as still running.
    #[serde(other)]
    Unknown,
}

impl ProcessingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConstraints {
    pub max_size_bytes: u64,
    #[serde(default)]
    pub allowed_types: Vec<String>,
}

/// Server-issued authorization to push one file's bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSlot {
    pub file_id: String,
    /// Absolute third-party URL or a path relative to the service address.
    pub upload_url: String,
    pub expires_at: DateTime<Utc>,
    pub constraints: UploadConstraints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub url: String,
    pub original_name: String,
    pub file_type: String,
    pub size_bytes: u64,
    pub context: ProcessingContext,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub metadata: Value,
    pub processing_state: ProcessingState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    pub files: Vec<FileRecord>,
    pub next_cursor: Option<String>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ProcessingContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaInfo {
    pub quota_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub allowed_file_types: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/v1/upload/request`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest<'a> {
    pub file_type: &'a str,
    pub file_name: &'a str,
    pub file_size_bytes: u64,
    pub context: ProcessingContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<&'a str>,
}

/// Everything needed to run one upload pipeline.
#[derive(Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    pub file_name: String,
    pub file_type: String,
    pub context: ProcessingContext,
    pub tags: Option<HashMap<String, String>>,
    pub webhook_url: Option<String>,
    pub cancellation: Option<CancellationToken>,
    pub on_progress: Option<ProgressCallback>,
    /// Skip the processing wait and return the record as first seen.
    pub wait_for_processing: bool,
}

impl UploadRequest {
    pub fn new(
        data: impl Into<Bytes>,
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        context: ProcessingContext,
    ) -> Self {
        Self {
            data: data.into(),
            file_name: file_name.into(),
            file_type: file_type.into(),
            context,
            tags: None,
            webhook_url: None,
            cancellation: None,
            on_progress: None,
            wait_for_processing: true,
        }
    }

    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_webhook(mut self, webhook_url: impl Into<String>) -> Self {
        self.webhook_url = Some(webhook_url.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn without_wait(mut self) -> Self {
        self.wait_for_processing = false;
        self
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("size_bytes", &self.data.len())
            .field("file_name", &self.file_name)
            .field("file_type", &self.file_type)
            .field("context", &self.context)
            .field("tags", &self.tags)
            .field("webhook_url", &self.webhook_url)
            .field("wait_for_processing", &self.wait_for_processing)
            .finish_non_exhaustive()
    }
}
