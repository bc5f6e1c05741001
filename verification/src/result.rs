//! The verdict of one verification pass and its strict/lax classification.

use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::{IdentifyError, ProofOutcome, TrackDiff};

/// A non-fatal, human-readable diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Warning(String);

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Warnings produced by a lax classification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn push(&mut self, warning: Warning) {
        self.0.push(warning);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.0.iter()
    }

    /// Log every warning.
    pub fn warn(&self) {
        for w in &self.0 {
            warn!("{}", w);
        }
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The result of one verification pass.
///
/// Built under the session lock while the pass runs; shared read-only
/// (usually through the cache) once it completes. If [`error`](Self::error)
/// is set the remaining fields are incomplete.
#[derive(Debug)]
pub struct IdentifyRes {
    pub(crate) error: Option<IdentifyError>,
    pub(crate) key_diff: Option<TrackDiff>,
    pub(crate) proof_checks: Vec<ProofOutcome>,
    /// Always empty: warnings are derived on demand by
    /// [`classify_error`](Self::classify_error). Kept for the shape of the
    /// result record.
    pub(crate) warnings: Vec<Warning>,
    pub(crate) messages: Vec<String>,
    pub(crate) me_set: bool,
}

impl IdentifyRes {
    /// An empty result. `me_set` records whether a viewer was present.
    pub fn new(me_set: bool) -> Self {
        Self {
            error: None,
            key_diff: None,
            proof_checks: Vec::with_capacity(1),
            warnings: Vec::new(),
            messages: Vec::with_capacity(1),
            me_set,
        }
    }

    pub fn add_proof_outcome(&mut self, outcome: ProofOutcome) {
        self.proof_checks.push(outcome);
    }

    /// Terminal error: verification could not proceed at all.
    pub fn error(&self) -> Option<&IdentifyError> {
        self.error.as_ref()
    }

    pub fn key_diff(&self) -> Option<&TrackDiff> {
        self.key_diff.as_ref()
    }

    pub fn proof_checks(&self) -> &[ProofOutcome] {
        &self.proof_checks
    }

    /// Stored warnings. Always empty; use
    /// [`get_error_lax`](Self::get_error_lax) for the lax warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Narration, in the order it was emitted.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn me_set(&self) -> bool {
        self.me_set
    }

    pub fn num_proof_failures(&self) -> usize {
        self.proof_checks.iter().filter(|c| c.error.is_some()).count()
    }

    pub fn num_track_failures(&self) -> usize {
        self.proof_checks
            .iter()
            .filter(|c| c.diff.as_ref().is_some_and(TrackDiff::breaks_tracking))
            .count()
    }

    /// Project the result onto an error and warnings.
    ///
    /// A terminal error is returned as-is. Otherwise proof failures are an
    /// error when `strict` and a warning when not; track failures are
    /// always an error.
    pub fn classify_error(&self, strict: bool) -> (Option<IdentifyError>, Warnings) {
        let mut warnings = Warnings::default();

        if let Some(err) = &self.error {
            return (Some(err.clone()), warnings);
        }

        let mut problems = Vec::new();

        let nfails = self.num_proof_failures();
        if nfails > 0 {
            let p = format!(
                "PROBLEM: {} proof{} failed remote checks",
                nfails,
                plural(nfails)
            );
            if strict {
                problems.push(p);
            } else {
                warnings.push(Warning::new(p));
            }
        }

        let ntf = self.num_track_failures();
        if ntf > 0 {
            problems.push(format!("{} track component{} failed", ntf, plural(ntf)));
        }

        let err = (!problems.is_empty()).then_some(IdentifyError::Verdict { problems });
        (err, warnings)
    }

    /// Strict verdict, for machine decisions.
    pub fn get_error(&self) -> Option<IdentifyError> {
        self.classify_error(true).0
    }

    /// Lax verdict, for decisions a human makes after reading the warnings.
    pub fn get_error_lax(&self) -> (Option<IdentifyError>, Warnings) {
        self.classify_error(false)
    }

    /// Machine-readable snapshot of the result.
    pub fn summary(&self) -> IdentifySummary {
        IdentifySummary {
            me_set: self.me_set,
            error: self.get_error().map(|e| e.to_string()),
            key_diff: self.key_diff.clone(),
            num_proof_failures: self.num_proof_failures(),
            num_track_failures: self.num_track_failures(),
            proof_checks: self
                .proof_checks
                .iter()
                .map(|c| ProofSummary {
                    service: c.proof.service.clone(),
                    username: c.proof.username.clone(),
                    ok: c.error.is_none(),
                    error: c.error.as_ref().map(|e| e.to_string()),
                    diff: c.diff.clone(),
                })
                .collect(),
            messages: self.messages.clone(),
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Serializable view of an [`IdentifyRes`].
#[derive(Clone, Debug, Serialize)]
pub struct IdentifySummary {
    pub me_set: bool,
    pub error: Option<String>,
    pub key_diff: Option<TrackDiff>,
    pub num_proof_failures: usize,
    pub num_track_failures: usize,
    pub proof_checks: Vec<ProofSummary>,
    pub messages: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProofSummary {
    pub service: String,
    pub username: String,
    pub ok: bool,
    pub error: Option<String>,
    pub diff: Option<TrackDiff>,
}
