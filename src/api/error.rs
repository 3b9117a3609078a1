use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Discriminant of [`ClientError`], handy for matching without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Authentication,
    QuotaExceeded,
    InvalidFileType,
    FileTooLarge,
    FileNotFound,
    Validation,
    Network,
    Upload,
    Generic,
}

/// A single field-level problem reported by a `VALIDATION_ERROR` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub message: String,
}

/// Wire shape of an error response: `{ "error": { code, message, details } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorEnvelope {
    #[serde(default)]
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String, status: Option<u16> },

    #[error("Quota exceeded: {message} ({used_bytes}/{quota_bytes} bytes used)")]
    QuotaExceeded {
        message: String,
        status: Option<u16>,
        quota_bytes: u64,
        used_bytes: u64,
    },

    #[error("Invalid file type '{file_type}': {message}")]
    InvalidFileType {
        message: String,
        status: Option<u16>,
        file_type: String,
        allowed_types: Vec<String>,
    },

    #[error("File too large: {message} ({size_bytes} > {max_size_bytes} bytes)")]
    FileTooLarge {
        message: String,
        status: Option<u16>,
        size_bytes: u64,
        max_size_bytes: u64,
    },

    #[error("File not found: {file_id}")]
    FileNotFound {
        message: String,
        status: Option<u16>,
        file_id: String,
    },

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        status: Option<u16>,
        errors: Vec<FieldError>,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        status: Option<u16>,
        last_error: Option<Box<ClientError>>,
    },

    #[error("Upload failed: {message}")]
    Upload {
        message: String,
        status: Option<u16>,
        cancelled: bool,
        cause: Option<String>,
    },

    #[error("{code}: {message}")]
    Generic {
        message: String,
        status: Option<u16>,
        code: String,
        details: Option<Value>,
    },
}

impl ClientError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status: None,
            last_error: None,
        }
    }

    pub fn upload(message: impl Into<String>, status: Option<u16>, cause: Option<String>) -> Self {
        Self::Upload {
            message: message.into(),
            status,
            cancelled: false,
            cause,
        }
    }

    pub fn cancelled() -> Self {
        Self::Upload {
            message: "Upload cancelled".to_string(),
            status: None,
            cancelled: true,
            cause: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            Self::InvalidFileType { .. } => ErrorKind::InvalidFileType,
            Self::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            Self::FileNotFound { .. } => ErrorKind::FileNotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Network { .. } => ErrorKind::Network,
            Self::Upload { .. } => ErrorKind::Upload,
            Self::Generic { .. } => ErrorKind::Generic,
        }
    }

    /// Human readable message, without the kind prefix used by `Display`.
    pub fn message(&self) -> &str {
        match self {
            Self::Configuration { message }
            | Self::Authentication { message, .. }
            | Self::QuotaExceeded { message, .. }
            | Self::InvalidFileType { message, .. }
            | Self::FileTooLarge { message, .. }
            | Self::FileNotFound { message, .. }
            | Self::Validation { message, .. }
            | Self::Network { message, .. }
            | Self::Upload { message, .. }
            | Self::Generic { message, .. } => message,
        }
    }

    /// HTTP status of the response that produced this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Configuration { .. } => None,
            Self::Authentication { status, .. }
            | Self::QuotaExceeded { status, .. }
            | Self::InvalidFileType { status, .. }
            | Self::FileTooLarge { status, .. }
            | Self::FileNotFound { status, .. }
            | Self::Validation { status, .. }
            | Self::Network { status, .. }
            | Self::Upload { status, .. }
            | Self::Generic { status, .. } => *status,
        }
    }

    /// Anything that did not come back with a sub-500 status may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.status(), Some(status) if status < 500)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Upload { cancelled: true, .. })
    }

    /// The failure observed on the final attempt of an exhausted retry loop.
    pub fn last_error(&self) -> Option<&ClientError> {
        match self {
            Self::Network { last_error, .. } => last_error.as_deref(),
            _ => None,
        }
    }
}
