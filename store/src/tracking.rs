//! Tracking statement storage trait.

use crate::StoreError;
use keyproof_types::{TrackingStatement, UserId};

/// Trait for reading the tracking statements a user has made about others.
pub trait TrackingStore: Send + Sync {
    /// The latest statement `tracker` made about the subject, if any.
    ///
    /// `Ok(None)` means the subject was never tracked; an `Err` means the
    /// store could not answer.
    fn tracking_statement_for(
        &self,
        tracker: &UserId,
        subject_name: &str,
        subject_id: &UserId,
    ) -> Result<Option<TrackingStatement>, StoreError>;
}
