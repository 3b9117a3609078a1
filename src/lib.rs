pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::api::{ClientError, ErrorKind, Result};
pub use crate::config::{ClientConfig, PollOptions, RetryPolicy};
pub use crate::models::{
    FileList, FileRecord, ListFilesOptions, ProcessingContext, ProcessingState, QuotaInfo,
    TenantInfo, TransferSlot, UploadRequest,
};
pub use tokio_util::sync::CancellationToken;

use crate::services::executor::RequestExecutor;
use crate::services::file_service::FileService;
use crate::services::poller::ProcessingPoller;
use crate::services::transfer::TransferOperation;
use crate::services::upload_service::UploadService;
use crate::utils::clock::{Clock, SystemClock};
use serde_json::Value;
use std::sync::Arc;

/// Entry point for talking to the file service.
///
/// Cheap to clone. Clones share the connection pool and the read-only
/// configuration; nothing else is shared between calls.
#[derive(Clone)]
pub struct FileClient {
    config: Arc<ClientConfig>,
    uploads: UploadService,
    files: FileService,
    poller: ProcessingPoller,
}

impl FileClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Builds a client whose retry and poll loops run on `clock`.
    pub fn with_clock(config: ClientConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("rust-file-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ClientError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        let config = Arc::new(config);
        let executor = RequestExecutor::new(http.clone(), config.clone(), clock.clone());
        let transfer = TransferOperation::new(http, config.clone());
        let poller = ProcessingPoller::new(executor.clone(), clock);
        let uploads = UploadService::new(
            executor.clone(),
            transfer,
            poller.clone(),
            config.poll,
        );

        Ok(Self {
            config,
            uploads,
            files: FileService::new(executor),
            poller,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Uploads a file and, unless disabled on the request, waits for processing.
    pub async fn upload(&self, request: UploadRequest) -> Result<FileRecord> {
        self.uploads.upload(request).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<FileRecord> {
        self.files.get_file(file_id).await
    }

    pub async fn list_files(&self, options: &ListFilesOptions) -> Result<FileList> {
        self.files.list_files(options).await
    }

    pub async fn list_all_files(&self, options: &ListFilesOptions) -> Result<Vec<FileRecord>> {
        self.files.list_all_files(options).await
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<Value> {
        self.files.delete_file(file_id).await
    }

    pub async fn get_quota(&self) -> Result<QuotaInfo> {
        self.files.get_quota().await
    }

    pub async fn get_tenant_info(&self) -> Result<TenantInfo> {
        self.files.get_tenant_info().await
    }

    /// Waits for an already uploaded file, using the configured poll budget
    /// unless `options` overrides it.
    pub async fn wait_for_processing(
        &self,
        file_id: &str,
        cancel: Option<&CancellationToken>,
        options: Option<PollOptions>,
    ) -> Result<FileRecord> {
        self.poller
            .wait_for_terminal(file_id, cancel, options.unwrap_or(self.config.poll))
            .await
    }
}
