//! Selection, normalization and enrichment pipeline
//!
//! This module provides:
//! - Event kind selection from the operator's allow-list
//! - Per-kind envelope normalization into flat records
//! - App/space/org annotation through the app cache
//! - The routing loop tying them to a log sink

pub mod annotator;
pub mod normalizer;
pub mod router;
pub mod selector;

pub use annotator::AppMetadataAnnotator;
pub use normalizer::normalize;
pub use router::{EventRouter, RouterStats, RouterStatsSnapshot};
pub use selector::{EventSelector, SelectionSet};
