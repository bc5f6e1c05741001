//! Nullable tracking store: in-memory tracking statements for testing.

use keyproof_store::{StoreError, TrackingStore};
use keyproof_types::{TrackingStatement, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory tracking store.
///
/// Statements are keyed by `(tracker, subject id)`. `fail_with` makes every
/// lookup return the given error.
pub struct NullTrackingStore {
    statements: Mutex<HashMap<(UserId, UserId), TrackingStatement>>,
    failure: Mutex<Option<StoreError>>,
    lookups: AtomicUsize,
}

impl NullTrackingStore {
    pub fn new() -> Self {
        Self {
            statements: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Record `statement` as the tracker's latest about its subject.
    pub fn put(&self, statement: TrackingStatement) {
        self.statements.lock().unwrap().insert(
            (statement.tracker.clone(), statement.subject_id.clone()),
            statement,
        );
    }

    pub fn fail_with(&self, err: StoreError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    /// Number of lookups served (for asserting cache behaviour).
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl Default for NullTrackingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingStore for NullTrackingStore {
    fn tracking_statement_for(
        &self,
        tracker: &UserId,
        _subject_name: &str,
        subject_id: &UserId,
    ) -> Result<Option<TrackingStatement>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self
            .statements
            .lock()
            .unwrap()
            .get(&(tracker.clone(), subject_id.clone()))
            .cloned())
    }
}
