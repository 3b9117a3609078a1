use crate::api::{ClientError, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

pub fn ensure_not_cancelled(token: Option<&CancellationToken>) -> Result<()> {
    match token {
        Some(token) if token.is_cancelled() => Err(ClientError::cancelled()),
        _ => Ok(()),
    }
}

/// Drives `fut` to completion unless `token` fires first, in which case the
/// future is dropped and a cancelled upload error is returned.
pub async fn until_cancelled<F>(token: Option<&CancellationToken>, fut: F) -> Result<F::Output>
where
    F: Future,
{
    match token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(ClientError::cancelled()),
            out = fut => Ok(out),
        },
        None => Ok(fut.await),
    }
}
