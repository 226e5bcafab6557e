//! App directory sources
//!
//! The directory is the authority the cache refreshes from. The file-backed
//! directory re-reads its JSON document on every fetch so operators can
//! update it without restarting the router.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::AppMetadata;

/// Result type for directory operations
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Directory error types
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// Reading the directory source failed
    #[error("Directory read error: {0}")]
    Io(#[from] std::io::Error),

    /// The directory document is malformed
    #[error("Directory parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The directory is temporarily unreachable
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

impl DirectoryError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, DirectoryError::Io(_) | DirectoryError::Unavailable(_))
    }
}

impl From<DirectoryError> for crate::error::Error {
    fn from(err: DirectoryError) -> Self {
        crate::error::Error::directory(err.to_string())
    }
}

/// Source of truth for application metadata
#[async_trait]
pub trait AppDirectory: Send + Sync {
    /// Fetch one application by id; `None` when the directory does not know it
    async fn fetch(&self, app_id: &str) -> DirectoryResult<Option<AppMetadata>>;
}

/// Directory backed by a JSON object mapping app ids to metadata
#[derive(Debug, Clone)]
pub struct FileAppDirectory {
    path: PathBuf,
}

impl FileAppDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every app in the directory
    pub async fn load_all(&self) -> DirectoryResult<HashMap<String, AppMetadata>> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[async_trait]
impl AppDirectory for FileAppDirectory {
    async fn fetch(&self, app_id: &str) -> DirectoryResult<Option<AppMetadata>> {
        let mut apps = self.load_all().await?;
        Ok(apps.remove(app_id))
    }
}

/// Directory that knows no applications
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyAppDirectory;

#[async_trait]
impl AppDirectory for EmptyAppDirectory {
    async fn fetch(&self, _app_id: &str) -> DirectoryResult<Option<AppMetadata>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn write_directory(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("apps-{}.json", Uuid::new_v4()));
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_file_directory_fetch() {
        let path = write_directory(
            r#"{
                "app-1": {"name": "billing", "spaceGuid": "s-1", "spaceName": "prod",
                          "orgGuid": "o-1", "orgName": "acme"}
            }"#,
        )
        .await;
        let directory = FileAppDirectory::new(&path);

        let app = directory.fetch("app-1").await.unwrap().unwrap();
        assert_eq!(app.name, "billing");
        assert_eq!(app.org_name, "acme");

        assert!(directory.fetch("app-2").await.unwrap().is_none());

        tokio::fs::remove_file(path).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_directory_errors() {
        let missing = FileAppDirectory::new("/nonexistent/apps.json");
        let err = missing.fetch("app-1").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Io(_)));
        assert!(err.is_retryable());

        let path = write_directory("not json").await;
        let malformed = FileAppDirectory::new(&path);
        let err = malformed.fetch("app-1").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Parse(_)));
        assert!(!err.is_retryable());

        tokio::fs::remove_file(path).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_directory() {
        assert!(EmptyAppDirectory.fetch("anything").await.unwrap().is_none());
    }
}
