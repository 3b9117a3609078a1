use crate::api::{ClientError, Result, UPLOAD_REQUEST_PATH};
use crate::config::PollOptions;
use crate::models::{FileRecord, ProgressCallback, SlotRequest, TransferSlot, UploadRequest};
use crate::services::executor::RequestExecutor;
use crate::services::poller::ProcessingPoller;
use crate::services::transfer::TransferOperation;
use crate::utils::cancel::ensure_not_cancelled;
use crate::utils::validation::validate_file_type;
use reqwest::Method;
use std::sync::Arc;
use tracing::info;

pub const PROGRESS_SLOT_READY: u8 = 10;
pub const PROGRESS_TRANSFERRED: u8 = 90;
pub const PROGRESS_DONE: u8 = 100;

/// Maps transfer progress (0..=100) onto the 10..=90 band of the overall upload.
pub fn scale_transfer_progress(percent: u8) -> u8 {
    let span = (PROGRESS_TRANSFERRED - PROGRESS_SLOT_READY) as f64 / 100.0;
    PROGRESS_SLOT_READY + (percent.min(100) as f64 * span).round() as u8
}

/// Drives one upload end to end: validate, request a slot, transfer, wait.
#[derive(Clone)]
pub struct UploadService {
    executor: RequestExecutor,
    transfer: TransferOperation,
    poller: ProcessingPoller,
    poll: PollOptions,
}

impl UploadService {
    pub fn new(
        executor: RequestExecutor,
        transfer: TransferOperation,
        poller: ProcessingPoller,
        poll: PollOptions,
    ) -> Self {
        Self {
            executor,
            transfer,
            poller,
            poll,
        }
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<FileRecord> {
        // 1. Catalog check, before anything touches the network
        validate_file_type(&request.file_type)?;

        let cancel = request.cancellation.as_ref();
        ensure_not_cancelled(cancel)?;

        info!(
            "📤 Uploading '{}' ({} bytes, {}, context={})",
            request.file_name,
            request.size_bytes(),
            request.file_type,
            request.context
        );

        // 2. Transfer slot
        let slot = self.request_slot(&request).await?;
        report(&request.on_progress, PROGRESS_SLOT_READY);

        // 3. Bytes
        self.transfer
            .transfer(
                &slot.upload_url,
                request.data.clone(),
                &request.file_type,
                request.on_progress.clone().map(transfer_band),
                cancel,
            )
            .await?;
        report(&request.on_progress, PROGRESS_TRANSFERRED);

        info!("Transferred '{}' as {}", request.file_name, slot.file_id);

        // 4. Processing
        let record = if request.wait_for_processing {
            self.poller
                .wait_for_terminal(&slot.file_id, cancel, self.poll)
                .await?
        } else {
            ensure_not_cancelled(cancel)?;
            self.poller.fetch(&slot.file_id).await?
        };
        report(&request.on_progress, PROGRESS_DONE);

        Ok(record)
    }

    pub async fn request_slot(&self, request: &UploadRequest) -> Result<TransferSlot> {
        let body = serde_json::to_value(SlotRequest {
            file_type: &request.file_type,
            file_name: &request.file_name,
            file_size_bytes: request.size_bytes(),
            context: request.context,
            tags: request.tags.as_ref(),
            webhook_url: request.webhook_url.as_deref(),
        })
        .map_err(|e| {
            ClientError::upload("Could not encode upload request", None, Some(e.to_string()))
        })?;

        self.executor
            .execute_as(Method::POST, UPLOAD_REQUEST_PATH, Some(&body))
            .await
    }
}

fn report(callback: &Option<ProgressCallback>, percent: u8) {
    if let Some(callback) = callback {
        callback(percent);
    }
}

// The band edges are reported by the pipeline itself, exactly once each.
fn transfer_band(outer: ProgressCallback) -> ProgressCallback {
    Arc::new(move |percent| {
        let scaled = scale_transfer_progress(percent);
        if scaled > PROGRESS_SLOT_READY && scaled < PROGRESS_TRANSFERRED {
            outer(scaled);
        }
    })
}
