use crate::api::{ApiErrorBody, ApiErrorEnvelope, ClientError, FieldError};
use serde_json::Value;

pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred";
pub const FALLBACK_CODE: &str = "UNKNOWN_ERROR";
const UNKNOWN_FILE_ID: &str = "unknown";

/// Raw failure data as observed at the boundary where it first happened.
#[derive(Debug)]
pub enum FailureContext {
    /// A response arrived with a non-success status.
    Response {
        status: u16,
        body: Option<ApiErrorBody>,
    },
    /// No response was received at all.
    Transport { message: String },
    /// Already normalized; passed through untouched.
    Classified(ClientError),
}

impl FailureContext {
    /// Builds a response context, parsing the error envelope if the body has one.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let body = serde_json::from_slice::<ApiErrorEnvelope>(body)
            .ok()
            .map(|envelope| envelope.error);
        Self::Response { status, body }
    }

    pub fn from_transport(err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("Request timed out: {}", err)
        } else if err.is_connect() {
            format!("Connection failed: {}", err)
        } else {
            format!("Request failed: {}", err)
        };
        Self::Transport { message }
    }
}

/// Maps a failure onto the closed error taxonomy. Total and side-effect free.
pub fn classify(context: FailureContext) -> ClientError {
    match context {
        FailureContext::Classified(err) => err,
        FailureContext::Transport { message } => ClientError::Network {
            message,
            status: None,
            last_error: None,
        },
        FailureContext::Response { status, body } => {
            classify_body(status, body.unwrap_or_default())
        }
    }
}

fn classify_body(status: u16, body: ApiErrorBody) -> ClientError {
    let status = Some(status);
    let details = body.details.unwrap_or(Value::Null);
    let message = |fallback: &str| body.message.clone().unwrap_or_else(|| fallback.to_string());

    match body.code.as_deref() {
        Some("UNAUTHORIZED") => ClientError::Authentication {
            message: message("Invalid or missing API key"),
            status,
        },
        Some("QUOTA_EXCEEDED") => ClientError::QuotaExceeded {
            message: message("Storage quota exceeded"),
            status,
            quota_bytes: detail_u64(&details, "quotaBytes"),
            used_bytes: detail_u64(&details, "usedBytes"),
        },
        Some("INVALID_FILE_TYPE") => ClientError::InvalidFileType {
            message: message("File type is not allowed"),
            status,
            file_type: detail_str(&details, "fileType").unwrap_or_default(),
            allowed_types: detail_str_list(&details, "allowedTypes"),
        },
        Some("FILE_TOO_LARGE") => ClientError::FileTooLarge {
            message: message("File exceeds the maximum allowed size"),
            status,
            size_bytes: detail_u64(&details, "sizeBytes"),
            max_size_bytes: detail_u64(&details, "maxSizeBytes"),
        },
        Some("FILE_NOT_FOUND") | Some("NOT_FOUND") => ClientError::FileNotFound {
            message: message("File not found"),
            status,
            file_id: detail_str(&details, "fileId").unwrap_or_else(|| UNKNOWN_FILE_ID.to_string()),
        },
        Some("VALIDATION_ERROR") => ClientError::Validation {
            message: message("Request validation failed"),
            status,
            errors: field_errors(&details),
        },
        code => ClientError::Generic {
            message: message(FALLBACK_MESSAGE),
            status,
            code: code.unwrap_or(FALLBACK_CODE).to_string(),
            details: (!details.is_null()).then_some(details.clone()),
        },
    }
}

fn detail_u64(details: &Value, key: &str) -> u64 {
    details.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn detail_str(details: &Value, key: &str) -> Option<String> {
    details.get(key).and_then(Value::as_str).map(str::to_string)
}

fn detail_str_list(details: &Value, key: &str) -> Vec<String> {
    details
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// Accepts either `details: [...]` or `details: { errors: [...] }`.
fn field_errors(details: &Value) -> Vec<FieldError> {
    let items = details
        .as_array()
        .or_else(|| details.get("errors").and_then(Value::as_array));

    items
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<FieldError>(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
