//! Nullable config store: records fingerprint writes.

use keyproof_store::{ConfigStore, StoreError};
use keyproof_types::PgpFingerprint;
use std::sync::Mutex;

/// An in-memory config store that remembers every write.
pub struct NullConfigStore {
    fingerprint: Mutex<Option<PgpFingerprint>>,
    writes: Mutex<Vec<PgpFingerprint>>,
}

impl NullConfigStore {
    pub fn new() -> Self {
        Self {
            fingerprint: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// A store with `fingerprint` already configured.
    pub fn with_fingerprint(fingerprint: PgpFingerprint) -> Self {
        let store = Self::new();
        *store.fingerprint.lock().unwrap() = Some(fingerprint);
        store
    }

    /// Every fingerprint written through `set_pgp_fingerprint`, in order.
    pub fn writes(&self) -> Vec<PgpFingerprint> {
        self.writes.lock().unwrap().clone()
    }
}

impl Default for NullConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for NullConfigStore {
    fn pgp_fingerprint(&self) -> Result<Option<PgpFingerprint>, StoreError> {
        Ok(*self.fingerprint.lock().unwrap())
    }

    fn set_pgp_fingerprint(&self, fingerprint: &PgpFingerprint) -> Result<(), StoreError> {
        *self.fingerprint.lock().unwrap() = Some(*fingerprint);
        self.writes.lock().unwrap().push(*fingerprint);
        Ok(())
    }
}
