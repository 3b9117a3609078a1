use crate::api::{ClientError, Result};
use crate::config::ClientConfig;
use crate::services::classifier::{FailureContext, classify};
use crate::utils::clock::Clock;
use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Issues API calls against the service with per-attempt timeouts and bounded retry.
///
/// Failures carrying a status below 500 are returned as soon as they are seen.
/// Everything else is retried with capped exponential backoff until
/// `max_retries` attempts have been made.
#[derive(Clone)]
pub struct RequestExecutor {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    clock: Arc<dyn Clock>,
}

impl RequestExecutor {
    pub fn new(http: reqwest::Client, config: Arc<ClientConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            config,
            clock,
        }
    }

    pub async fn execute(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.config.resolve(path);
        let request_id = Uuid::new_v4().to_string();
        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            debug!(
                "{} {} (attempt {}/{}, request_id={})",
                method,
                path,
                attempt + 1,
                attempts,
                request_id
            );

            let err = match self.attempt(&method, &url, body, &request_id).await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            if attempt + 1 < attempts {
                let delay = self.config.retry.delay_for(attempt);
                warn!(
                    "🔁 {} {} failed ({}), retrying in {:?}",
                    method, path, err, delay
                );
                self.clock.sleep(delay).await;
            }
            last_error = Some(err);
        }

        Err(ClientError::Network {
            message: format!("Request failed after {} attempts", attempts),
            status: None,
            last_error: last_error.map(Box::new),
        })
    }

    /// Like [`execute`](Self::execute), decoding the success body into `T`.
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let value = self.execute(method, path, body).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Generic {
            message: format!("Unexpected response shape from {}: {}", path, e),
            status: None,
            code: "INVALID_RESPONSE".to_string(),
            details: None,
        })
    }

    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        request_id: &str,
    ) -> Result<Value> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .timeout(self.config.timeout)
            .header(AUTHORIZATION, self.config.bearer())
            .header(REQUEST_ID_HEADER, request_id);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(FailureContext::from_transport(&e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify(FailureContext::from_transport(&e)))?;

        if !status.is_success() {
            return Err(classify(FailureContext::from_response(
                status.as_u16(),
                &bytes,
            )));
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| ClientError::Generic {
            message: format!("Response body is not valid JSON: {}", e),
            status: Some(status.as_u16()),
            code: "INVALID_RESPONSE".to_string(),
            details: None,
        })
    }
}
