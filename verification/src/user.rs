//! The party being verified (or doing the verifying).

use std::fmt;
use std::sync::Arc;

use keyproof_types::{PgpFingerprint, UserId};

use crate::{EmptyProofTable, IdentifyError, ProofCheckTable};

/// A user as loaded from the identity service.
#[derive(Clone)]
pub struct User {
    id: UserId,
    name: String,
    active_fingerprint: Option<PgpFingerprint>,
    id_table: Arc<dyn ProofCheckTable>,
}

impl User {
    /// A user with no remote proofs.
    pub fn new(id: UserId, name: impl Into<String>, active_fingerprint: Option<PgpFingerprint>) -> Self {
        Self {
            id,
            name: name.into(),
            active_fingerprint,
            id_table: Arc::new(EmptyProofTable),
        }
    }

    pub fn with_id_table(mut self, id_table: Arc<dyn ProofCheckTable>) -> Self {
        self.id_table = id_table;
        self
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn active_fingerprint(&self) -> Option<&PgpFingerprint> {
        self.active_fingerprint.as_ref()
    }

    /// The active fingerprint, or [`IdentifyError::NoActiveKey`].
    pub fn get_active_pgp_fingerprint(&self) -> Result<PgpFingerprint, IdentifyError> {
        self.active_fingerprint
            .ok_or_else(|| IdentifyError::NoActiveKey {
                user: self.name.clone(),
            })
    }

    /// The subject's remote proofs.
    pub fn id_table(&self) -> &dyn ProofCheckTable {
        self.id_table.as_ref()
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active_fingerprint", &self.active_fingerprint)
            .finish_non_exhaustive()
    }
}
