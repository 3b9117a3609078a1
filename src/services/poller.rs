use crate::api::{Result, file_path};
use crate::config::PollOptions;
use crate::models::FileRecord;
use crate::services::executor::RequestExecutor;
use crate::utils::cancel::{ensure_not_cancelled, until_cancelled};
use crate::utils::clock::Clock;
use reqwest::Method;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Waits for server-side processing of a file to reach a terminal state.
///
/// Cancellation is an error. Running out of time is not: the last observed
/// record is returned even if processing is still under way.
#[derive(Clone)]
pub struct ProcessingPoller {
    executor: RequestExecutor,
    clock: Arc<dyn Clock>,
}

impl ProcessingPoller {
    pub fn new(executor: RequestExecutor, clock: Arc<dyn Clock>) -> Self {
        Self { executor, clock }
    }

    pub async fn wait_for_terminal(
        &self,
        file_id: &str,
        cancel: Option<&CancellationToken>,
        options: PollOptions,
    ) -> Result<FileRecord> {
        let started = self.clock.now();

        while self.clock.now().duration_since(started) < options.max_wait {
            ensure_not_cancelled(cancel)?;

            let record = until_cancelled(cancel, self.fetch(file_id)).await??;
            if record.processing_state.is_terminal() {
                info!(
                    "✅ File {} reached {:?} after {:?}",
                    file_id,
                    record.processing_state,
                    self.clock.now().duration_since(started)
                );
                return Ok(record);
            }

            debug!(
                "File {} still {:?}, next check in {:?}",
                file_id, record.processing_state, options.poll_interval
            );
            until_cancelled(cancel, self.clock.sleep(options.poll_interval)).await?;
        }

        ensure_not_cancelled(cancel)?;
        let record = until_cancelled(cancel, self.fetch(file_id)).await??;
        if !record.processing_state.is_terminal() {
            warn!(
                "⏳ File {} still {:?} after {:?}, returning without waiting further",
                file_id, record.processing_state, options.max_wait
            );
        }
        Ok(record)
    }

    pub async fn fetch(&self, file_id: &str) -> Result<FileRecord> {
        self.executor
            .execute_as(Method::GET, &file_path(file_id), None)
            .await
    }
}
