use keyproof_store::StoreError;
use keyproof_types::PgpFingerprint;
use thiserror::Error;

/// Errors surfaced by identify and self-verification.
///
/// `Clone` because a terminal error lives inside a cached [`IdentifyRes`]
/// and is handed out on every classification.
///
/// [`IdentifyRes`]: crate::IdentifyRes
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IdentifyError {
    #[error("no active public key for user {user}")]
    NoActiveKey { user: String },

    #[error("tracking lookup failed: {0}")]
    TrackingLookup(StoreError),

    /// Aggregated proof and track problems, joined with `;`.
    #[error("{}", .problems.join(";"))]
    Verdict { problems: Vec<String> },

    #[error(
        "wrong key: configured fingerprint {} does not match server fingerprint {}",
        .configured.to_quads(),
        .expected.to_quads()
    )]
    WrongKey {
        configured: PgpFingerprint,
        expected: PgpFingerprint,
    },

    #[error("needs input: {0}")]
    NeedInput(String),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("could not read local config: {0}")]
    ConfigRead(StoreError),

    #[error("could not write local config: {0}")]
    ConfigWrite(StoreError),
}

impl IdentifyError {
    /// A human decision is required; retrying interactively may succeed.
    #[must_use]
    pub fn is_need_input(&self) -> bool {
        matches!(self, Self::NeedInput(_))
    }

    /// The user explicitly declined the confirmation prompt.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Prompt(PromptError::Rejected))
    }
}

/// Outcome of an interactive confirmation other than acceptance.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("confirmation rejected")]
    Rejected,

    #[error("prompt failed: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_joins_problems_with_semicolon() {
        let err = IdentifyError::Verdict {
            problems: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "a;b");
    }

    #[test]
    fn wrong_key_renders_both_fingerprints_as_quads() {
        let configured = PgpFingerprint::new([0x11; 20]);
        let expected = PgpFingerprint::new([0xab; 20]);
        let msg = IdentifyError::WrongKey {
            configured,
            expected,
        }
        .to_string();
        assert!(msg.contains(&configured.to_quads()));
        assert!(msg.contains(&expected.to_quads()));
    }

    #[test]
    fn classification_helpers() {
        assert!(IdentifyError::NeedInput("x".into()).is_need_input());
        assert!(IdentifyError::from(PromptError::Rejected).is_rejected());
        assert!(!IdentifyError::from(PromptError::Io("eof".into())).is_rejected());
    }
}
