//! Local configuration storage trait.

use crate::StoreError;
use keyproof_types::PgpFingerprint;

/// Trait for the locally persisted configuration the verifier relies on.
pub trait ConfigStore: Send + Sync {
    /// The fingerprint the local user has accepted as their own, if any.
    fn pgp_fingerprint(&self) -> Result<Option<PgpFingerprint>, StoreError>;

    /// Persist `fingerprint` as the local user's own.
    fn set_pgp_fingerprint(&self, fingerprint: &PgpFingerprint) -> Result<(), StoreError>;
}
