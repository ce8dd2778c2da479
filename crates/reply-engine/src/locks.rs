//! Per-subject mutual exclusion.
//!
//! The engine serializes the resolve/check/commit sequence per subject so
//! two in-flight messages from the same peer cannot both pass the quota
//! check before either commits. Unrelated subjects never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use database::Subject;

/// A keyed lock map. Idle entries are collected on the next acquire.
#[derive(Default)]
pub struct SubjectLocks {
    inner: Mutex<HashMap<Subject, Arc<tokio::sync::Mutex<()>>>>,
}

impl SubjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for a subject, creating it if needed.
    ///
    /// The caller holds the returned `Arc` for the duration of processing;
    /// entries nobody holds are dropped here before the lookup.
    pub fn lock_for(&self, subject: Subject) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        map.entry(subject).or_default().clone()
    }

    /// Number of live entries, for tests and status reporting.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
