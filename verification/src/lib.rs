//! Identity verification reconciliation.
//!
//! Given a subject's active key fingerprint, an optional tracking statement
//! the viewer made earlier, and the outcomes of the subject's remote proof
//! checks, produce one verdict:
//!
//! 1. **Tracking lookup**: what the viewer recorded last time, if anything.
//! 2. **Key check**: the live fingerprint, diffed against the tracked one.
//! 3. **Proof pass**: every remote proof is checked; failures are recorded,
//!    never fatal to the pass.
//!
//! The resulting [`IdentifyRes`] is classified into an error and warnings
//! only when a caller asks for a verdict, strictly (machine decisions) or
//! laxly (human-facing warnings). Track failures are always errors.
//!
//! [`SelfVerifier`] runs the same pass against the local user to detect a
//! server-side key substitution before persisting a fingerprint.

pub mod cache;
pub mod diff;
pub mod error;
pub mod key;
pub mod orchestrator;
pub mod proof;
pub mod result;
pub mod self_verify;
pub mod session;
pub mod terminal;
pub mod track;
pub mod user;

pub use cache::{CacheKey, IdentifyCache};
pub use diff::TrackDiff;
pub use error::{IdentifyError, PromptError};
pub use key::identify_key;
pub use orchestrator::Identifier;
pub use proof::{
    EmptyProofTable, ProofCheckTable, ProofChecker, ProofDescriptor, ProofError, ProofOutcome,
    RemoteProofSet,
};
pub use result::{IdentifyRes, IdentifySummary, Warning, Warnings};
pub use self_verify::SelfVerifier;
pub use session::{IdentifyArg, IdentifySession, ReportHook, SessionGuard};
pub use terminal::{DiscardSink, NarrationSink, Prompter};
pub use track::TrackLookup;
pub use user::User;
