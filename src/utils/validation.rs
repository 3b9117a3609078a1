use crate::api::{ClientError, Result};
use std::path::Path;

/// Maximum payload size accepted by the service: 100 MB
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024; // 100 MB

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Document,
    Image,
    Spreadsheet,
    Text,
    Archive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTypeInfo {
    pub media_type: &'static str,
    pub extension: &'static str,
    pub category: FileCategory,
}

const fn entry(
    media_type: &'static str,
    extension: &'static str,
    category: FileCategory,
) -> FileTypeInfo {
    FileTypeInfo {
        media_type,
        extension,
        category,
    }
}

/// Media types the service will accept, with their canonical extension
pub const ALLOWED_FILE_TYPES: &[FileTypeInfo] = &[
    // Documents
    entry("application/pdf", "pdf", FileCategory::Document),
    entry("application/msword", "doc", FileCategory::Document),
    entry(
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
        FileCategory::Document,
    ),
    entry("application/rtf", "rtf", FileCategory::Document),
    // Images
    entry("image/jpeg", "jpg", FileCategory::Image),
    entry("image/png", "png", FileCategory::Image),
    entry("image/gif", "gif", FileCategory::Image),
    entry("image/webp", "webp", FileCategory::Image),
    entry("image/heic", "heic", FileCategory::Image),
    entry("image/tiff", "tiff", FileCategory::Image),
    // Spreadsheets
    entry("application/vnd.ms-excel", "xls", FileCategory::Spreadsheet),
    entry(
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
        FileCategory::Spreadsheet,
    ),
    entry("text/csv", "csv", FileCategory::Spreadsheet),
    // Text
    entry("text/plain", "txt", FileCategory::Text),
    entry("application/json", "json", FileCategory::Text),
    // Archives
    entry("application/zip", "zip", FileCategory::Archive),
];

// Extensions that map onto an allowed type but are not its canonical form.
const EXTENSION_ALIASES: &[(&str, &str)] = &[("jpeg", "image/jpeg"), ("tif", "image/tiff")];

/// Lowercased media type without parameters (`text/plain; charset=utf-8` -> `text/plain`).
pub fn normalize_media_type(content_type: &str) -> String {
    match content_type.trim().parse::<mime::Mime>() {
        Ok(parsed) => parsed.essence_str().to_lowercase(),
        Err(_) => content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase(),
    }
}

pub fn file_type_info(content_type: &str) -> Option<&'static FileTypeInfo> {
    let normalized = normalize_media_type(content_type);
    ALLOWED_FILE_TYPES
        .iter()
        .find(|info| info.media_type == normalized)
}

pub fn is_allowed_type(content_type: &str) -> bool {
    file_type_info(content_type).is_some()
}

pub fn allowed_types() -> Vec<String> {
    ALLOWED_FILE_TYPES
        .iter()
        .map(|info| info.media_type.to_string())
        .collect()
}

/// Looks up the allowed media type for a file extension (case-insensitive).
pub fn type_for_extension(extension: &str) -> Option<&'static str> {
    let ext = extension.trim_start_matches('.').to_lowercase();
    ALLOWED_FILE_TYPES
        .iter()
        .find(|info| info.extension == ext)
        .map(|info| info.media_type)
        .or_else(|| {
            EXTENSION_ALIASES
                .iter()
                .find(|(alias, _)| *alias == ext)
                .map(|(_, media_type)| *media_type)
        })
}

/// Validates a declared media type against the catalog
pub fn validate_file_type(content_type: &str) -> Result<()> {
    if is_allowed_type(content_type) {
        return Ok(());
    }

    Err(ClientError::InvalidFileType {
        message: format!("File type '{}' is not allowed", content_type),
        status: None,
        file_type: content_type.to_string(),
        allowed_types: allowed_types(),
    })
}

/// Validates payload size against the catalog maximum
pub fn validate_file_size(size: u64) -> Result<()> {
    if size > MAX_FILE_SIZE {
        return Err(ClientError::FileTooLarge {
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                MAX_FILE_SIZE,
                MAX_FILE_SIZE / 1024 / 1024
            ),
            status: None,
            size_bytes: size,
            max_size_bytes: MAX_FILE_SIZE,
        });
    }
    Ok(())
}

/// Final path component of `path`, used as the declared upload name.
pub fn file_name_from_path(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .trim();

    if name.is_empty() {
        return Err(ClientError::Validation {
            message: format!("Cannot derive a file name from '{}'", path.display()),
            status: None,
            errors: vec![crate::api::FieldError {
                path: "fileName".to_string(),
                message: "File name cannot be empty".to_string(),
            }],
        });
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;

    #[test]
    fn test_validate_file_type() {
        assert!(validate_file_type("image/jpeg").is_ok());
        assert!(validate_file_type("application/pdf").is_ok());
        assert!(validate_file_type("Text/Plain; charset=utf-8").is_ok());

        let err = validate_file_type("application/x-msdownload").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFileType);
        match err {
            ClientError::InvalidFileType {
                file_type,
                allowed_types,
                ..
            } => {
                assert_eq!(file_type, "application/x-msdownload");
                assert!(allowed_types.contains(&"image/png".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024).is_ok());
        assert!(validate_file_size(MAX_FILE_SIZE).is_ok());
        assert_eq!(
            validate_file_size(MAX_FILE_SIZE + 1).unwrap_err().kind(),
            ErrorKind::FileTooLarge
        );
    }

    #[test]
    fn test_type_for_extension() {
        assert_eq!(type_for_extension("PDF"), Some("application/pdf"));
        assert_eq!(type_for_extension(".jpeg"), Some("image/jpeg"));
        assert_eq!(type_for_extension("exe"), None);
    }

    #[test]
    fn test_catalog_metadata() {
        let info = file_type_info("image/webp").unwrap();
        assert_eq!(info.extension, "webp");
        assert_eq!(info.category, FileCategory::Image);
    }

    #[test]
    fn test_file_name_from_path() {
        assert_eq!(
            file_name_from_path(Path::new("/tmp/scans/receipt.pdf")).unwrap(),
            "receipt.pdf"
        );
        assert!(file_name_from_path(Path::new("/")).is_err());
    }
}
