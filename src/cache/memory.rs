//! In-memory application cache

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{AppCache, AppDirectory, AppMetadata, DirectoryError};
use crate::logging::Timer;

/// Backoff settings for directory fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// First retry delay
    pub initial_interval: Duration,
    /// Upper bound for a single retry delay
    pub max_interval: Duration,
    /// Total time budget for one refresh
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(2),
            max_elapsed: Duration::from_secs(10),
        }
    }
}

/// App cache held in memory and refreshed one app at a time
pub struct InMemoryAppCache {
    apps: RwLock<HashMap<String, AppMetadata>>,
    directory: Arc<dyn AppDirectory>,
    retry: RetryPolicy,
}

impl InMemoryAppCache {
    /// Create an empty cache backed by a directory
    pub fn new(directory: Arc<dyn AppDirectory>, retry: RetryPolicy) -> Self {
        Self {
            apps: RwLock::new(HashMap::new()),
            directory,
            retry,
        }
    }

    /// Seed the cache with known apps
    pub async fn preload(&self, apps: HashMap<String, AppMetadata>) {
        let count = apps.len();
        self.apps.write().await.extend(apps);
        debug!(count, "Preloaded app cache");
    }

    /// Number of cached apps
    pub async fn len(&self) -> usize {
        self.apps.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.apps.read().await.is_empty()
    }

    /// Fetch from the directory, retrying transient failures
    async fn fetch_with_retry(&self, app_id: &str) -> Result<Option<AppMetadata>, DirectoryError> {
        let backoff = ExponentialBackoff {
            initial_interval: self.retry.initial_interval,
            max_interval: self.retry.max_interval,
            max_elapsed_time: Some(self.retry.max_elapsed),
            multiplier: 2.0,
            ..Default::default()
        };

        let operation = || async {
            self.directory.fetch(app_id).await.map_err(|e| {
                if e.is_retryable() {
                    warn!(app_id, error = %e, "App directory fetch failed, will retry");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        };

        backoff::future::retry(backoff, operation).await
    }
}

#[async_trait]
impl AppCache for InMemoryAppCache {
    async fn lookup(&self, app_id: &str) -> AppMetadata {
        self.apps
            .read()
            .await
            .get(app_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn refresh(&self, app_id: &str) {
        let timer = Timer::start("app_cache_refresh");

        match self.fetch_with_retry(app_id).await {
            Ok(Some(app)) => {
                debug!(app_id, app_name = %app.name, "Refreshed app metadata");
                self.apps.write().await.insert(app_id.to_string(), app);
            },
            Ok(None) => {
                debug!(app_id, "App not found in directory");
            },
            Err(e) => {
                warn!(app_id, error = %e, "Giving up on app directory fetch");
            },
        }

        timer.stop();
    }
}
