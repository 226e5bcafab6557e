//! Application metadata annotation
//!
//! Enriches a normalized record carrying an application id with the app,
//! space and org identity resolved through the app cache.

use std::sync::Arc;
use tracing::debug;

use crate::cache::{AppCache, AppMetadata};
use crate::models::NormalizedRecord;

pub const CF_APP_NAME: &str = "cf_app_name";
pub const CF_SPACE_ID: &str = "cf_space_id";
pub const CF_SPACE_NAME: &str = "cf_space_name";
pub const CF_ORG_ID: &str = "cf_org_id";
pub const CF_ORG_NAME: &str = "cf_org_name";

/// Adds app/space/org identity to records
#[derive(Clone)]
pub struct AppMetadataAnnotator {
    cache: Arc<dyn AppCache>,
}

impl AppMetadataAnnotator {
    pub fn new(cache: Arc<dyn AppCache>) -> Self {
        Self { cache }
    }

    /// Annotate a record in place.
    ///
    /// Records without a non-empty `cf_app_id` are left untouched. Only
    /// non-empty metadata values are added, and existing keys are never
    /// overwritten. Returns the number of fields added.
    pub async fn annotate(&self, record: &mut NormalizedRecord) -> usize {
        let app_id = match record.app_id() {
            Some(app_id) => app_id.to_string(),
            None => return 0,
        };

        let app = self.resolve(&app_id).await;

        let mut added = 0;
        for (key, value) in [
            (CF_APP_NAME, &app.name),
            (CF_SPACE_ID, &app.space_guid),
            (CF_SPACE_NAME, &app.space_name),
            (CF_ORG_ID, &app.org_guid),
            (CF_ORG_NAME, &app.org_name),
        ] {
            if record.insert_absent(key, value) {
                added += 1;
            }
        }
        added
    }

    /// Resolve an app id: cache lookup, then at most one refresh followed
    /// by a final lookup whose result is used as-is.
    pub async fn resolve(&self, app_id: &str) -> AppMetadata {
        let app = self.cache.lookup(app_id).await;
        if app.is_known() {
            return app;
        }

        debug!(app_id, "App not cached, refreshing from directory");
        self.cache.refresh(app_id).await;
        self.cache.lookup(app_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::CF_APP_ID;
    use crate::models::{EventKind, FieldValue, Fields};
    use crate::test_utils::MockAppCache;

    fn billing_app() -> AppMetadata {
        AppMetadata {
            name: "billing".to_string(),
            space_guid: "space-1".to_string(),
            space_name: "production".to_string(),
            org_guid: "org-1".to_string(),
            org_name: "acme".to_string(),
        }
    }

    fn record_for(app_id: &str) -> NormalizedRecord {
        NormalizedRecord::new(EventKind::LogMessage, "doppler").with(CF_APP_ID, app_id)
    }

    #[tokio::test]
    async fn test_empty_record_is_unchanged() {
        let cache = Arc::new(MockAppCache::new());
        let annotator = AppMetadataAnnotator::new(cache.clone());

        let mut record = NormalizedRecord::default();
        assert_eq!(annotator.annotate(&mut record).await, 0);
        assert_eq!(record, NormalizedRecord::default());

        let mut record = NormalizedRecord::from_parts(Fields::new(), "");
        annotator.annotate(&mut record).await;
        assert_eq!(record, NormalizedRecord::from_parts(Fields::new(), ""));

        assert_eq!(cache.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_app_id_is_unchanged() {
        let cache = Arc::new(MockAppCache::new());
        let annotator = AppMetadataAnnotator::new(cache.clone());

        let mut record = record_for("");
        let before = record.clone();
        annotator.annotate(&mut record).await;

        assert_eq!(record, before);
        assert_eq!(cache.lookup_count(), 0);
        assert!(cache.refreshed().is_empty());
    }

    #[tokio::test]
    async fn test_cached_app_needs_no_refresh() {
        let cache = Arc::new(MockAppCache::new().with_cached("app-1", billing_app()));
        let annotator = AppMetadataAnnotator::new(cache.clone());

        let mut record = record_for("app-1");
        assert_eq!(annotator.annotate(&mut record).await, 5);

        assert_eq!(record.get(CF_APP_NAME), Some(&FieldValue::from("billing")));
        assert_eq!(record.get(CF_SPACE_ID), Some(&FieldValue::from("space-1")));
        assert_eq!(record.get(CF_SPACE_NAME), Some(&FieldValue::from("production")));
        assert_eq!(record.get(CF_ORG_ID), Some(&FieldValue::from("org-1")));
        assert_eq!(record.get(CF_ORG_NAME), Some(&FieldValue::from("acme")));
        assert_eq!(cache.lookup_count(), 1);
        assert!(cache.refreshed().is_empty());
    }

    #[tokio::test]
    async fn test_cache_miss_refreshes_once() {
        let cache = Arc::new(MockAppCache::new().with_directory("app-1", billing_app()));
        let annotator = AppMetadataAnnotator::new(cache.clone());

        let mut record = record_for("app-1");
        annotator.annotate(&mut record).await;

        assert_eq!(record.get(CF_APP_NAME), Some(&FieldValue::from("billing")));
        assert_eq!(cache.lookup_count(), 2);
        assert_eq!(cache.refreshed(), vec!["app-1".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_app_is_not_retried_again() {
        let cache = Arc::new(MockAppCache::new());
        let annotator = AppMetadataAnnotator::new(cache.clone());

        let mut record = record_for("ghost");
        let before = record.clone();
        assert_eq!(annotator.annotate(&mut record).await, 0);

        assert_eq!(record, before);
        assert_eq!(cache.lookup_count(), 2);
        assert_eq!(cache.refreshed().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_metadata_values_are_omitted() {
        let partial = AppMetadata {
            name: "billing".to_string(),
            org_name: "acme".to_string(),
            ..Default::default()
        };
        let cache = Arc::new(MockAppCache::new().with_cached("app-1", partial));
        let annotator = AppMetadataAnnotator::new(cache);

        let mut record = record_for("app-1");
        assert_eq!(annotator.annotate(&mut record).await, 2);

        assert!(record.get(CF_SPACE_ID).is_none());
        assert!(record.get(CF_SPACE_NAME).is_none());
        assert!(record.get(CF_ORG_ID).is_none());
        assert_eq!(record.get(CF_ORG_NAME), Some(&FieldValue::from("acme")));
    }

    #[tokio::test]
    async fn test_existing_keys_are_not_overwritten() {
        let cache = Arc::new(MockAppCache::new().with_cached("app-1", billing_app()));
        let annotator = AppMetadataAnnotator::new(cache);

        let mut record = record_for("app-1").with(CF_ORG_NAME, "original");
        assert_eq!(annotator.annotate(&mut record).await, 4);

        assert_eq!(record.get(CF_ORG_NAME), Some(&FieldValue::from("original")));
        assert_eq!(record.get(CF_APP_ID), Some(&FieldValue::from("app-1")));
    }
}
