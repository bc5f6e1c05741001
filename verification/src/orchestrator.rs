//! Verification orchestrator. Connects the tracking lookup, the key check
//! and the proof-check pass into a single cached verification.

use std::sync::{Arc, PoisonError};

use keyproof_store::TrackingStore;
use keyproof_utils::format_time;
use tracing::{debug, info_span};

use crate::{
    identify_key, CacheKey, IdentifyArg, IdentifyCache, IdentifyError, IdentifyRes,
    IdentifySession, NarrationSink, ReportHook, TrackLookup, User,
};

/// Runs verification passes and caches their results.
pub struct Identifier {
    tracking: Arc<dyn TrackingStore>,
    sink: Arc<dyn NarrationSink>,
    cache: IdentifyCache,
}

impl Identifier {
    pub fn new(tracking: Arc<dyn TrackingStore>, sink: Arc<dyn NarrationSink>) -> Self {
        Self {
            tracking,
            sink,
            cache: IdentifyCache::default(),
        }
    }

    pub fn with_cache(mut self, cache: IdentifyCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &IdentifyCache {
        &self.cache
    }

    pub fn sink(&self) -> &dyn NarrationSink {
        self.sink.as_ref()
    }

    /// A report hook that forwards narration to this identifier's sink.
    pub fn report_hook(&self) -> ReportHook {
        let sink = Arc::clone(&self.sink);
        Arc::new(move |s: &str| sink.output(s))
    }

    /// Verify `subject` as seen by `arg.me`.
    ///
    /// A cached result for the same subject and viewer presence is returned
    /// as-is, without new narration. Failed passes (a terminal error) are
    /// not cached.
    pub fn identify(&self, subject: &User, arg: &IdentifyArg<'_>) -> Arc<IdentifyRes> {
        let key = CacheKey::new(subject.id().clone(), arg.me_set());
        let flight = self.cache.flight(&key);
        let res = {
            let _in_flight = flight.lock().unwrap_or_else(PoisonError::into_inner);
            match self.cache.get(&key) {
                Some(cached) => cached,
                None => self.identify_uncached(subject, arg, &key),
            }
        };
        drop(flight);
        self.cache.end_flight(&key);
        res
    }

    fn identify_uncached(
        &self,
        subject: &User,
        arg: &IdentifyArg<'_>,
        key: &CacheKey,
    ) -> Arc<IdentifyRes> {
        let span = info_span!("identify", user = %subject.name(), me_set = arg.me_set());
        let _enter = span.enter();

        let res = Arc::new(self.run_pass(subject, arg));
        if res.error().is_none() {
            self.cache.insert(key.clone(), Arc::clone(&res));
        }
        res
    }

    /// Identify with narration routed to the sink; strict verdict.
    pub fn identify_simple(&self, subject: &User, me: Option<&User>) -> Result<(), IdentifyError> {
        let arg = IdentifyArg {
            report_hook: Some(self.report_hook()),
            me,
        };
        match self.identify(subject, &arg).get_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn run_pass(&self, subject: &User, arg: &IdentifyArg<'_>) -> IdentifyRes {
        let mut session = IdentifySession::new(arg, IdentifyRes::new(arg.me_set()), subject);

        if let Some(me) = arg.me {
            match self
                .tracking
                .tracking_statement_for(me.id(), subject.name(), subject.id())
            {
                Err(err) => return session.fail(IdentifyError::TrackingLookup(err)),
                Ok(Some(statement)) => {
                    let track = TrackLookup::new(statement);
                    let msg = format!(
                        "You last tracked {} on {}",
                        subject.name(),
                        format_time(track.ctime())
                    );
                    session.set_track(track);
                    session.report(msg);
                }
                Ok(None) => {}
            }
        }

        debug!("+ Identify({})", subject.name());

        if let Err(err) = identify_key(&session) {
            return session.fail(err);
        }
        subject.id_table().identify(&session);

        debug!("- Identify({})", subject.name());
        session.into_result()
    }
}
