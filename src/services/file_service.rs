use crate::api::{
    ClientError, FILES_PATH, Result, TENANT_INFO_PATH, TENANT_QUOTA_PATH, file_path,
};
use crate::models::{FileList, FileRecord, ListFilesOptions, QuotaInfo, TenantInfo};
use crate::services::executor::RequestExecutor;
use reqwest::Method;
use serde_json::Value;

/// Read and delete operations on stored files and tenant metadata.
#[derive(Clone)]
pub struct FileService {
    executor: RequestExecutor,
}

impl FileService {
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    pub async fn get_file(&self, file_id: &str) -> Result<FileRecord> {
        self.executor
            .execute_as(Method::GET, &file_path(file_id), None)
            .await
    }

    pub async fn list_files(&self, options: &ListFilesOptions) -> Result<FileList> {
        let query = serde_urlencoded::to_string(options)
            .map_err(|e| ClientError::configuration(format!("Invalid list options: {}", e)))?;
        let path = if query.is_empty() {
            FILES_PATH.to_string()
        } else {
            format!("{}?{}", FILES_PATH, query)
        };

        self.executor.execute_as(Method::GET, &path, None).await
    }

    /// Follows `nextCursor` until the listing is exhausted.
    pub async fn list_all_files(&self, options: &ListFilesOptions) -> Result<Vec<FileRecord>> {
        let mut page_options = options.clone();
        let mut files = Vec::new();

        loop {
            let page = self.list_files(&page_options).await?;
            let fetched = page.files.len();
            files.extend(page.files);

            match page.next_cursor {
                Some(cursor)
                    if fetched > 0 && page_options.cursor.as_deref() != Some(cursor.as_str()) =>
                {
                    page_options.cursor = Some(cursor);
                }
                _ => break,
            }
        }

        tracing::debug!("Listed {} files", files.len());
        Ok(files)
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<Value> {
        self.executor
            .execute(Method::DELETE, &file_path(file_id), None)
            .await
    }

    pub async fn get_quota(&self) -> Result<QuotaInfo> {
        self.executor
            .execute_as(Method::GET, TENANT_QUOTA_PATH, None)
            .await
    }

    pub async fn get_tenant_info(&self) -> Result<TenantInfo> {
        self.executor
            .execute_as(Method::GET, TENANT_INFO_PATH, None)
            .await
    }
}
