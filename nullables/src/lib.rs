//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator of the verification core (clock, tracking store,
//! config store, prompt, narration output, remote proofs) is abstracted
//! behind a trait. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record how they were called, for assertions
//! - Never touch the filesystem, the network or a terminal
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod config;
pub mod proofs;
pub mod prompt;
pub mod sink;
pub mod store;

pub use clock::NullClock;
pub use config::NullConfigStore;
pub use proofs::{CountingProofTable, FixedProof};
pub use prompt::NullPrompter;
pub use sink::RecordingSink;
pub use store::NullTrackingStore;
