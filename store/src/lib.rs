//! Abstract storage traits for keyproof.
//!
//! Every storage backend (the CLI's TOML files, in-memory for testing)
//! implements these traits. The verification core depends only on the traits.

pub mod config;
pub mod error;
pub mod tracking;

pub use config::ConfigStore;
pub use error::StoreError;
pub use tracking::TrackingStore;
