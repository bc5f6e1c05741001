//! Tracking statements: what a viewer recorded about another user.

use serde::{Deserialize, Serialize};

use crate::{PgpFingerprint, Timestamp, UserId};

/// A previously recorded assertion by `tracker` that `fingerprint` and the
/// listed proofs belong to the subject.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStatement {
    /// The user who made the statement.
    pub tracker: UserId,
    /// The tracked user's stable id.
    pub subject_id: UserId,
    /// The tracked user's name at tracking time.
    pub subject_name: String,
    /// Fingerprint observed when tracking. `None` when the subject had no
    /// key at the time.
    #[serde(default)]
    pub fingerprint: Option<PgpFingerprint>,
    /// When the statement was made.
    pub ctime: Timestamp,
    /// Remote proofs and the state they were observed in.
    #[serde(default)]
    pub proofs: Vec<TrackedProof>,
}

/// One remote proof as it was observed when tracking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProof {
    pub service: String,
    pub username: String,
    pub state: ProofState,
}

impl TrackedProof {
    /// Key used to match a tracked proof against a live one.
    pub fn key(&self) -> String {
        format!("{}:{}", self.service, self.username)
    }
}

/// Whether a proof checked out when it was last observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofState {
    Ok,
    Failed,
}

impl ProofState {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}
