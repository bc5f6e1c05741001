use thiserror::Error;

/// Failure of a tracking or config backend.
///
/// Carries rendered messages only, so it stays `Clone` and can be kept
/// inside a cached verification error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A record that must exist is missing. "No statement" is `Ok(None)`,
    /// never this.
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("backend unavailable: {0}")]
    Backend(String),

    #[error("could not encode or decode record: {0}")]
    Serialization(String),

    /// A record decoded but violates its own invariants, e.g. a tracking
    /// statement whose tracker is not the requesting user.
    #[error("corrupted record: {0}")]
    Corruption(String),
}
