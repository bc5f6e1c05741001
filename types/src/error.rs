//! Errors raised while parsing fundamental types.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid fingerprint: {reason}")]
    InvalidFingerprint { reason: String },

    #[error("invalid user id: {0}")]
    InvalidUserId(String),
}
