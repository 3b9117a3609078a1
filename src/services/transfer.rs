use crate::api::{ClientError, Result};
use crate::config::ClientConfig;
use crate::models::ProgressCallback;
use crate::services::classifier::{FailureContext, classify};
use crate::utils::cancel::{ensure_not_cancelled, until_cancelled};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Size of the slices handed to the HTTP body. Progress granularity follows it.
pub const TRANSFER_CHUNK_SIZE: usize = 64 * 1024;

/// Turns cumulative byte counts into a non-decreasing percentage, emitting
/// only when the integer value grows.
pub(crate) struct ProgressTracker {
    total: u64,
    sent: u64,
    last: u8,
    callback: ProgressCallback,
}

impl ProgressTracker {
    pub(crate) fn new(total: u64, callback: ProgressCallback) -> Self {
        Self {
            total,
            sent: 0,
            last: 0,
            callback,
        }
    }

    pub(crate) fn advance(&mut self, bytes: u64) {
        if self.total == 0 {
            return;
        }
        self.sent = (self.sent + bytes).min(self.total);
        let percent = (self.sent * 100 / self.total) as u8;
        if percent > self.last {
            self.last = percent;
            (self.callback)(percent);
        }
    }
}

/// Single PUT of a whole payload to a transfer slot destination.
#[derive(Clone)]
pub struct TransferOperation {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl TransferOperation {
    pub fn new(http: reqwest::Client, config: Arc<ClientConfig>) -> Self {
        Self { http, config }
    }

    pub async fn transfer(
        &self,
        destination: &str,
        payload: Bytes,
        media_type: &str,
        on_progress: Option<ProgressCallback>,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        ensure_not_cancelled(cancel)?;

        let (url, service_owned) = self.resolve_destination(destination)?;
        let size = payload.len() as u64;

        tracing::debug!(
            "Transferring {} bytes to {} (authenticated: {})",
            size,
            url,
            service_owned
        );

        let mut request = self
            .http
            .put(url.as_str())
            .timeout(self.config.timeout)
            .header(CONTENT_TYPE, media_type)
            .header(CONTENT_LENGTH, size)
            .body(progress_body(payload, on_progress));

        // Third-party destinations are pre-signed; our credential must not leak there.
        if service_owned {
            request = request.header(AUTHORIZATION, self.config.bearer());
        }

        let response = until_cancelled(cancel, request.send())
            .await?
            .map_err(|e| classify(FailureContext::from_transport(&e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = until_cancelled(cancel, response.text())
            .await?
            .unwrap_or_default();

        tracing::warn!("Transfer to {} rejected with status {}", url, status);

        Err(ClientError::upload(
            format!("Upload failed with status {}", status.as_u16()),
            Some(status.as_u16()),
            (!body.trim().is_empty()).then_some(body),
        ))
    }

    /// Service-relative paths go to our own API with credentials; anything
    /// else must be an absolute URL.
    fn resolve_destination(&self, destination: &str) -> Result<(Url, bool)> {
        let (raw, service_owned) = if destination.starts_with('/') {
            (self.config.resolve(destination), true)
        } else {
            (destination.to_string(), false)
        };

        let url = Url::parse(&raw).map_err(|e| {
            ClientError::upload(
                format!("Invalid upload destination '{}'", destination),
                None,
                Some(e.to_string()),
            )
        })?;

        Ok((url, service_owned))
    }
}

fn progress_body(payload: Bytes, on_progress: Option<ProgressCallback>) -> reqwest::Body {
    let total = payload.len();
    let callback = match on_progress {
        Some(callback) if total > 0 => callback,
        _ => return reqwest::Body::from(payload),
    };

    let mut tracker = ProgressTracker::new(total as u64, callback);
    let chunks = (0..total)
        .step_by(TRANSFER_CHUNK_SIZE)
        .map(move |start| payload.slice(start..(start + TRANSFER_CHUNK_SIZE).min(total)));

    let stream = futures::stream::iter(chunks).map(move |chunk| {
        tracker.advance(chunk.len() as u64);
        Ok::<Bytes, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(stream)
}
