//! Lookup over a tracking statement, computing diffs against live state.

use std::collections::HashMap;

use keyproof_types::{PgpFingerprint, ProofState, Timestamp, TrackedProof, TrackingStatement};

use crate::TrackDiff;

/// A tracking statement indexed for diffing.
#[derive(Clone, Debug)]
pub struct TrackLookup {
    statement: TrackingStatement,
    proofs: HashMap<String, ProofState>,
}

impl TrackLookup {
    pub fn new(statement: TrackingStatement) -> Self {
        let proofs = statement
            .proofs
            .iter()
            .map(|p| (p.key(), p.state))
            .collect();
        Self { statement, proofs }
    }

    /// When the viewer tracked the subject.
    pub fn ctime(&self) -> Timestamp {
        self.statement.ctime
    }

    pub fn statement(&self) -> &TrackingStatement {
        &self.statement
    }

    /// Compare the subject's current key with the tracked one.
    pub fn compute_key_diff(&self, current: &PgpFingerprint) -> TrackDiff {
        match &self.statement.fingerprint {
            None => TrackDiff::New,
            Some(tracked) if tracked == current => TrackDiff::Unchanged,
            Some(tracked) => TrackDiff::Clash {
                expected: tracked.to_quads(),
            },
        }
    }

    /// Compare one proof's live result with the tracked state.
    /// `key` is `service:username`.
    pub fn compute_proof_diff(&self, key: &str, ok: bool) -> TrackDiff {
        match self.proofs.get(key) {
            None => TrackDiff::New,
            Some(tracked) if tracked.is_ok() == ok => TrackDiff::Unchanged,
            Some(tracked) if tracked.is_ok() => TrackDiff::RemoteFail,
            Some(_) => TrackDiff::RemoteWorking,
        }
    }

    /// Tracked proofs in statement order.
    pub fn tracked_proofs(&self) -> impl Iterator<Item = &TrackedProof> {
        self.statement.proofs.iter()
    }
}
