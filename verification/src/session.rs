//! Per-call request and the lock-protected state of one verification pass.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{IdentifyError, IdentifyRes, ProofOutcome, TrackDiff, TrackLookup, User};

/// Narration marker for a passing check.
pub const CHECK: &str = "\u{2714}";
/// Narration marker for a failing check.
pub const CROSS: &str = "\u{2716}";

/// Live progress side channel. Called once per narration message, with a
/// trailing newline, in emission order.
pub type ReportHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Immutable input to one identify call.
#[derive(Clone, Default)]
pub struct IdentifyArg<'a> {
    pub report_hook: Option<ReportHook>,
    /// The user doing the verifying. `None` is an anonymous viewer.
    pub me: Option<&'a User>,
}

impl<'a> IdentifyArg<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_me(mut self, me: &'a User) -> Self {
        self.me = Some(me);
        self
    }

    pub fn with_report_hook(mut self, hook: ReportHook) -> Self {
        self.report_hook = Some(hook);
        self
    }

    pub fn me_set(&self) -> bool {
        self.me.is_some()
    }
}

/// Context threaded through one verification pass.
///
/// The result is only reachable through the lock: proof checks may run on
/// several threads and report concurrently.
pub struct IdentifySession<'a> {
    arg: &'a IdentifyArg<'a>,
    subject: &'a User,
    track: Option<TrackLookup>,
    res: Mutex<IdentifyRes>,
}

impl<'a> IdentifySession<'a> {
    pub fn new(arg: &'a IdentifyArg<'a>, res: IdentifyRes, subject: &'a User) -> Self {
        Self {
            arg,
            subject,
            track: None,
            res: Mutex::new(res),
        }
    }

    pub fn arg(&self) -> &IdentifyArg<'a> {
        self.arg
    }

    pub fn subject(&self) -> &User {
        self.subject
    }

    /// The viewer's tracking statement about the subject, if any.
    pub fn track(&self) -> Option<&TrackLookup> {
        self.track.as_ref()
    }

    pub(crate) fn set_track(&mut self, track: TrackLookup) {
        self.track = Some(track);
    }

    /// Hold the session lock for a compound mutation. Released on drop.
    pub fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            res: self.res.lock().unwrap_or_else(PoisonError::into_inner),
            hook: self.arg.report_hook.as_ref(),
        }
    }

    /// Append a narration message and forward it to the report hook.
    pub fn report(&self, message: impl Into<String>) {
        self.lock().report(message);
    }

    pub fn add_proof_outcome(&self, outcome: ProofOutcome) {
        self.lock().add_proof_outcome(outcome);
    }

    /// Record a terminal error and hand back the (incomplete) result.
    pub(crate) fn fail(self, err: IdentifyError) -> IdentifyRes {
        let mut res = self.into_result();
        res.error = Some(err);
        res
    }

    pub(crate) fn into_result(self) -> IdentifyRes {
        self.res.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive access to the result under construction.
pub struct SessionGuard<'s> {
    res: MutexGuard<'s, IdentifyRes>,
    hook: Option<&'s ReportHook>,
}

impl SessionGuard<'_> {
    pub fn report(&mut self, message: impl Into<String>) {
        let message = message.into();
        if let Some(hook) = self.hook {
            hook(&format!("{message}\n"));
        }
        self.res.messages.push(message);
    }

    pub fn add_proof_outcome(&mut self, outcome: ProofOutcome) {
        self.res.add_proof_outcome(outcome);
    }

    pub fn result(&self) -> &IdentifyRes {
        &self.res
    }

    pub(crate) fn set_key_diff(&mut self, diff: TrackDiff) {
        self.res.key_diff = Some(diff);
    }
}
