//! Fundamental types for keyproof identity verification.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! key fingerprints, user identifiers, timestamps, and tracking statements.

pub mod error;
pub mod fingerprint;
pub mod time;
pub mod tracking;
pub mod user;

pub use error::TypeError;
pub use fingerprint::PgpFingerprint;
pub use time::{Clock, SystemClock, Timestamp};
pub use tracking::{ProofState, TrackedProof, TrackingStatement};
pub use user::UserId;
