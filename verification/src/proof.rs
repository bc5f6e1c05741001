//! Remote proof checks and their outcomes.
//!
//! The core does not check proofs itself. A [`ProofChecker`] wraps one
//! externally hosted proof (a GitHub gist, a DNS TXT record, ...);
//! a [`ProofCheckTable`] runs a subject's checks inside a verification pass
//! and records one [`ProofOutcome`] per proof on the session.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use keyproof_types::PgpFingerprint;

use crate::session::{CHECK, CROSS};
use crate::{IdentifySession, TrackDiff};

/// Which remote account a proof claims.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ProofDescriptor {
    pub service: String,
    pub username: String,
}

impl ProofDescriptor {
    pub fn new(service: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            username: username.into(),
        }
    }

    /// `service:username`, matching [`TrackedProof::key`].
    ///
    /// [`TrackedProof::key`]: keyproof_types::TrackedProof::key
    pub fn key(&self) -> String {
        format!("{}:{}", self.service, self.username)
    }
}

impl fmt::Display for ProofDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" on {}", self.username, self.service)
    }
}

/// Why a single proof did not check out.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("proof not found at {0}")]
    NotFound(String),

    #[error("proof does not reference the active key")]
    ContentMismatch,

    #[error("service unreachable: {0}")]
    Unreachable(String),

    #[error("proof was deleted")]
    Deleted,

    #[error("{0}")]
    Other(String),
}

/// The result of checking one proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofOutcome {
    pub proof: ProofDescriptor,
    /// `None` when the proof checked out.
    pub error: Option<ProofError>,
    /// Comparison with the tracked state; `None` when nothing was tracked.
    pub diff: Option<TrackDiff>,
}

impl ProofOutcome {
    pub fn ok(proof: ProofDescriptor) -> Self {
        Self {
            proof,
            error: None,
            diff: None,
        }
    }

    pub fn failed(proof: ProofDescriptor, error: ProofError) -> Self {
        Self {
            proof,
            error: Some(error),
            diff: None,
        }
    }

    pub fn with_diff(mut self, diff: TrackDiff) -> Self {
        self.diff = Some(diff);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// One narration line, e.g. `✔ tracked "alice" on github`.
    pub fn narration(&self) -> String {
        let prefix = self
            .diff
            .as_ref()
            .map(|d| format!("{} ", d.to_display_string()))
            .unwrap_or_default();
        match &self.error {
            None => format!("{CHECK} {prefix}{}", self.proof),
            Some(e) => format!("{CROSS} {prefix}{}: {e}", self.proof),
        }
    }
}

/// Checks one externally hosted proof against the subject's key.
pub trait ProofChecker: Send + Sync {
    fn descriptor(&self) -> &ProofDescriptor;

    fn check(&self, fingerprint: &PgpFingerprint) -> Result<(), ProofError>;
}

/// The proof-check pass of a verification.
///
/// Implementations must attempt every proof and record each outcome via
/// [`IdentifySession::add_proof_outcome`]; an individual failure never
/// aborts the pass.
pub trait ProofCheckTable: Send + Sync {
    fn identify(&self, session: &IdentifySession<'_>);
}

/// A subject with no remote proofs.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyProofTable;

impl ProofCheckTable for EmptyProofTable {
    fn identify(&self, _session: &IdentifySession<'_>) {}
}

/// Runs a subject's proof checkers concurrently.
///
/// Each completed check records its narration and outcome in one critical
/// section, so `messages` and `proof_checks` agree on order. Order across
/// checks is completion order.
#[derive(Clone, Default)]
pub struct RemoteProofSet {
    checkers: Vec<Arc<dyn ProofChecker>>,
}

impl RemoteProofSet {
    pub fn new(checkers: Vec<Arc<dyn ProofChecker>>) -> Self {
        Self { checkers }
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }
}

impl ProofCheckTable for RemoteProofSet {
    fn identify(&self, session: &IdentifySession<'_>) {
        let Some(fingerprint) = session.subject().active_fingerprint().copied() else {
            session.report(format!(
                "{CROSS} no active key; skipped {} proof check(s)",
                self.checkers.len()
            ));
            return;
        };
        let track = session.track();

        self.checkers.par_iter().for_each(|checker| {
            let proof = checker.descriptor().clone();
            let result = checker.check(&fingerprint);
            debug!(proof = %proof.key(), ok = result.is_ok(), "proof checked");

            let diff = track.map(|t| t.compute_proof_diff(&proof.key(), result.is_ok()));
            let outcome = ProofOutcome {
                proof,
                error: result.err(),
                diff,
            };

            let mut guard = session.lock();
            guard.report(outcome.narration());
            guard.add_proof_outcome(outcome);
        });

        let Some(track) = track else {
            return;
        };
        let live: HashSet<String> = self.checkers.iter().map(|c| c.descriptor().key()).collect();
        for tracked in track.tracked_proofs().filter(|p| !live.contains(&p.key())) {
            let outcome = ProofOutcome::failed(
                ProofDescriptor::new(&tracked.service, &tracked.username),
                ProofError::Deleted,
            )
            .with_diff(TrackDiff::Deleted);

            let mut guard = session.lock();
            guard.report(outcome.narration());
            guard.add_proof_outcome(outcome);
        }
    }
}
