//! Event kind selection
//!
//! Turns the operator's comma-separated allow-list into a validated
//! selection set. Unknown names are reported and skipped; when nothing
//! validates, the selection falls back to the default kind so the router
//! never ends up silently disabled.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::models::{EventKind, DEFAULT_EVENT_KIND};

/// The set of kinds the router will process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionSet {
    kinds: BTreeSet<EventKind>,
}

impl SelectionSet {
    /// Build a selection from explicit kinds, falling back to the default
    /// kind when `kinds` is empty
    pub fn from_kinds(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        let mut kinds: BTreeSet<EventKind> = kinds.into_iter().collect();
        if kinds.is_empty() {
            kinds.insert(DEFAULT_EVENT_KIND);
        }
        Self { kinds }
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Selected kinds in registry order
    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.kinds.iter().copied()
    }

    /// Selected kind names in registry order
    pub fn names(&self) -> Vec<&'static str> {
        self.kinds().map(|kind| kind.as_str()).collect()
    }
}

impl Default for SelectionSet {
    fn default() -> Self {
        Self::from_kinds([])
    }
}

/// Validates configured kind names against a registry
#[derive(Debug, Clone, Copy)]
pub struct EventSelector {
    registry: &'static [EventKind],
}

impl Default for EventSelector {
    fn default() -> Self {
        Self::new(&EventKind::ALL)
    }
}

impl EventSelector {
    pub fn new(registry: &'static [EventKind]) -> Self {
        Self { registry }
    }

    /// Parse a comma-separated list of kind names into a selection.
    ///
    /// Tokens must match a registry name exactly. Rejected tokens are
    /// reported at WARN level.
    pub fn select(&self, wanted: &str) -> SelectionSet {
        let (kinds, rejected) = self.partition(wanted);

        for name in &rejected {
            warn!(event_name = %name, "Rejected event name");
        }

        if kinds.is_empty() {
            info!(
                default = %DEFAULT_EVENT_KIND,
                "No valid event names selected, falling back to default"
            );
        }

        SelectionSet::from_kinds(kinds)
    }

    /// All registry names joined by ", ", in registry order
    pub fn list_authorized_kinds(&self) -> String {
        self.registry
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn resolve(&self, name: &str) -> Option<EventKind> {
        self.registry
            .iter()
            .copied()
            .find(|kind| kind.as_str() == name)
    }

    /// Split tokens into recognized kinds and rejected names
    fn partition<'a>(&self, wanted: &'a str) -> (BTreeSet<EventKind>, Vec<&'a str>) {
        let mut kinds = BTreeSet::new();
        let mut rejected = Vec::new();

        for token in wanted.split(',') {
            match self.resolve(token) {
                Some(kind) => {
                    kinds.insert(kind);
                },
                None => rejected.push(token),
            }
        }

        (kinds, rejected)
    }
}
