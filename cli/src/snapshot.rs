//! Recorded identity data: users, their hosted proofs and tracking
//! statements, loaded from a TOML snapshot instead of a live service.
//!
//! ```toml
//! [[users]]
//! id = "0123456789abcdef0123456789abcdef"
//! name = "alice"
//! fingerprint = "0123456789abcdef0123456789abcdef01234567"
//!
//! [[users.proofs]]
//! service = "github"
//! username = "alice"
//!
//! [[tracking]]
//! tracker = "fedcba9876543210fedcba9876543210"
//! subject_id = "0123456789abcdef0123456789abcdef"
//! subject_name = "alice"
//! fingerprint = "0123456789abcdef0123456789abcdef01234567"
//! ctime = 1700000000
//! proofs = [{ service = "github", username = "alice", state = "ok" }]
//! ```

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use keyproof_store::{StoreError, TrackingStore};
use keyproof_types::{PgpFingerprint, TrackingStatement, UserId};
use keyproof_verification::{ProofChecker, ProofDescriptor, ProofError, RemoteProofSet, User};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid snapshot: {0}")]
    Parse(String),
}

/// A recorded hosted proof.
#[derive(Clone, Debug, Deserialize)]
pub struct ProofRecord {
    pub service: String,
    pub username: String,
    /// Fingerprint the proof text names. Unset means it names the user's
    /// active key.
    #[serde(default)]
    pub fingerprint: Option<PgpFingerprint>,
    /// Recorded failure, e.g. "not found" or "unreachable: timeout".
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub fingerprint: Option<PgpFingerprint>,
    #[serde(default)]
    pub proofs: Vec<ProofRecord>,
}

/// Checks a proof against what was recorded for it.
pub struct RecordedProof {
    descriptor: ProofDescriptor,
    record: ProofRecord,
}

impl RecordedProof {
    pub fn new(record: ProofRecord) -> Self {
        Self {
            descriptor: ProofDescriptor::new(&record.service, &record.username),
            record,
        }
    }
}

impl ProofChecker for RecordedProof {
    fn descriptor(&self) -> &ProofDescriptor {
        &self.descriptor
    }

    fn check(&self, fingerprint: &PgpFingerprint) -> Result<(), ProofError> {
        if let Some(error) = &self.record.error {
            return Err(recorded_error(error));
        }
        match &self.record.fingerprint {
            Some(named) if named != fingerprint => Err(ProofError::ContentMismatch),
            _ => Ok(()),
        }
    }
}

fn recorded_error(error: &str) -> ProofError {
    let (kind, detail) = match error.split_once(':') {
        Some((kind, detail)) => (kind.trim(), detail.trim()),
        None => (error.trim(), ""),
    };
    match kind {
        "not found" => ProofError::NotFound(detail.to_string()),
        "mismatch" => ProofError::ContentMismatch,
        "unreachable" => ProofError::Unreachable(detail.to_string()),
        "deleted" => ProofError::Deleted,
        _ => ProofError::Other(error.to_string()),
    }
}

/// Users and tracking statements recorded in one file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default)]
    tracking: Vec<TrackingStatement>,
}

impl Snapshot {
    pub fn from_toml_file(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, SnapshotError> {
        toml::from_str(s).map_err(|e| SnapshotError::Parse(e.to_string()))
    }

    /// Look a user up by name or id and build it with its recorded proofs.
    pub fn user(&self, name_or_id: &str) -> Option<User> {
        let record = self
            .users
            .iter()
            .find(|u| u.name == name_or_id || u.id.as_str() == name_or_id)?;
        let checkers: Vec<Arc<dyn ProofChecker>> = record
            .proofs
            .iter()
            .cloned()
            .map(|p| Arc::new(RecordedProof::new(p)) as Arc<dyn ProofChecker>)
            .collect();
        Some(
            User::new(record.id.clone(), record.name.clone(), record.fingerprint)
                .with_id_table(Arc::new(RemoteProofSet::new(checkers))),
        )
    }
}

impl TrackingStore for Snapshot {
    /// The newest statement `tracker` made about the subject.
    fn tracking_statement_for(
        &self,
        tracker: &UserId,
        _subject_name: &str,
        subject_id: &UserId,
    ) -> Result<Option<TrackingStatement>, StoreError> {
        Ok(self
            .tracking
            .iter()
            .filter(|t| &t.tracker == tracker && &t.subject_id == subject_id)
            .max_by_key(|t| t.ctime)
            .cloned())
    }
}
