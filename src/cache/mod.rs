//! Application metadata cache
//!
//! This module defines the cache contract the annotator resolves app
//! identity through, along with:
//! - An in-memory cache refreshed from an app directory
//! - The app directory contract and its file-backed implementation
//! - Retry with exponential backoff for transient directory failures

pub mod directory;
pub mod memory;

pub use directory::{AppDirectory, DirectoryError, DirectoryResult, EmptyAppDirectory, FileAppDirectory};
pub use memory::{InMemoryAppCache, RetryPolicy};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Ownership metadata for one application
///
/// Any field may be empty, meaning "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppMetadata {
    pub name: String,
    pub space_guid: String,
    pub space_name: String,
    pub org_guid: String,
    pub org_name: String,
}

impl AppMetadata {
    /// Whether the cache knows this app at all
    pub fn is_known(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Cache of application metadata keyed by app id
#[async_trait]
pub trait AppCache: Send + Sync {
    /// Cache-only lookup; never reaches the directory
    async fn lookup(&self, app_id: &str) -> AppMetadata;

    /// Fetch one app from the directory and update the cache.
    ///
    /// The outcome is observed only through a subsequent `lookup`.
    async fn refresh(&self, app_id: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_metadata_deserialization() {
        let json = r#"{"name": "billing", "spaceGuid": "s-1", "orgName": "acme"}"#;
        let app: AppMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(app.name, "billing");
        assert_eq!(app.space_guid, "s-1");
        assert_eq!(app.space_name, "");
        assert_eq!(app.org_name, "acme");
        assert!(app.is_known());
        assert!(!AppMetadata::default().is_known());
    }
}
