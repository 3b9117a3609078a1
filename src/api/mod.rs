pub mod error;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub use error::{ApiErrorBody, ApiErrorEnvelope, ClientError, ErrorKind, FieldError, Result};

pub const UPLOAD_REQUEST_PATH: &str = "/api/v1/upload/request";
pub const FILES_PATH: &str = "/api/v1/files";
pub const TENANT_QUOTA_PATH: &str = "/api/v1/tenant/quota";
pub const TENANT_INFO_PATH: &str = "/api/v1/tenant/info";

// RFC 3986 unreserved characters stay as-is.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Path of a single file resource, with the id percent-encoded.
pub fn file_path(file_id: &str) -> String {
    format!("{}/{}", FILES_PATH, utf8_percent_encode(file_id, PATH_SEGMENT))
}
