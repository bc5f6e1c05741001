//! Nullable proofs: checkers with fixed answers and a counting table.

use keyproof_types::PgpFingerprint;
use keyproof_verification::{
    IdentifySession, ProofCheckTable, ProofChecker, ProofDescriptor, ProofError,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A proof checker that always gives the same answer.
pub struct FixedProof {
    descriptor: ProofDescriptor,
    result: Result<(), ProofError>,
}

impl FixedProof {
    pub fn passing(service: &str, username: &str) -> Self {
        Self {
            descriptor: ProofDescriptor::new(service, username),
            result: Ok(()),
        }
    }

    pub fn failing(service: &str, username: &str, error: ProofError) -> Self {
        Self {
            descriptor: ProofDescriptor::new(service, username),
            result: Err(error),
        }
    }
}

impl ProofChecker for FixedProof {
    fn descriptor(&self) -> &ProofDescriptor {
        &self.descriptor
    }

    fn check(&self, _fingerprint: &PgpFingerprint) -> Result<(), ProofError> {
        self.result.clone()
    }
}

/// Wraps another table and counts how many passes ran through it.
pub struct CountingProofTable<T> {
    inner: T,
    passes: AtomicUsize,
}

impl<T: ProofCheckTable> CountingProofTable<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            passes: AtomicUsize::new(0),
        }
    }

    pub fn passes(&self) -> usize {
        self.passes.load(Ordering::SeqCst)
    }
}

impl<T: ProofCheckTable> ProofCheckTable for CountingProofTable<T> {
    fn identify(&self, session: &IdentifySession<'_>) {
        self.passes.fetch_add(1, Ordering::SeqCst);
        self.inner.identify(session);
    }
}
