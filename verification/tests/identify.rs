use std::sync::{Arc, Mutex};
use std::thread;

use keyproof_nullables::{
    CountingProofTable, FixedProof, NullClock, NullTrackingStore, RecordingSink,
};
use keyproof_store::StoreError;
use keyproof_types::{PgpFingerprint, ProofState, Timestamp, TrackedProof, TrackingStatement, UserId};
use keyproof_verification::{
    EmptyProofTable, IdentifyArg, IdentifyCache, IdentifyError, Identifier, ProofChecker,
    ProofError, RemoteProofSet, TrackDiff, User,
};

fn uid(c: char) -> UserId {
    UserId::new(c.to_string().repeat(32)).unwrap()
}

fn fp(b: u8) -> PgpFingerprint {
    PgpFingerprint::new([b; 20])
}

fn viewer() -> User {
    User::new(uid('b'), "bob", Some(fp(0xbb)))
}

fn statement(fingerprint: Option<PgpFingerprint>, proofs: Vec<TrackedProof>) -> TrackingStatement {
    TrackingStatement {
        tracker: uid('b'),
        subject_id: uid('a'),
        subject_name: "alice".into(),
        fingerprint,
        ctime: Timestamp::new(1_700_000_000),
        proofs,
    }
}

fn tracked(service: &str, username: &str, state: ProofState) -> TrackedProof {
    TrackedProof {
        service: service.into(),
        username: username.into(),
        state,
    }
}

fn identifier(store: Arc<NullTrackingStore>) -> Identifier {
    Identifier::new(store, Arc::new(RecordingSink::new()))
}

fn recording_hook() -> (keyproof_verification::ReportHook, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let hook: keyproof_verification::ReportHook = Arc::new(move |s: &str| {
        sink.lock().unwrap().push(s.to_string());
    });
    (hook, seen)
}

#[test]
fn missing_key_is_a_terminal_error_with_no_narration() {
    let store = Arc::new(NullTrackingStore::new());
    let ident = identifier(store);
    let alice = User::new(uid('a'), "alice", None);

    let res = ident.identify(&alice, &IdentifyArg::new());

    assert!(matches!(res.error(), Some(IdentifyError::NoActiveKey { .. })));
    assert!(res.messages().is_empty());
    assert!(res.get_error().is_some());
    assert!(ident.cache().is_empty());
}

#[test]
fn missing_key_after_tracking_narration_keeps_only_that_message() {
    let store = Arc::new(NullTrackingStore::new());
    store.put(statement(Some(fp(0xaa)), Vec::new()));
    let ident = identifier(store);
    let alice = User::new(uid('a'), "alice", None);
    let bob = viewer();

    let res = ident.identify(&alice, &IdentifyArg::new().with_me(&bob));

    assert!(matches!(res.error(), Some(IdentifyError::NoActiveKey { .. })));
    assert_eq!(
        res.messages(),
        ["You last tracked alice on 2023-11-14 22:13:20 UTC"]
    );
}

#[test]
fn unchanged_tracked_key_passes() {
    let store = Arc::new(NullTrackingStore::new());
    store.put(statement(Some(fp(0xaa)), Vec::new()));
    let ident = identifier(store);
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa)));
    let bob = viewer();

    let res = ident.identify(&alice, &IdentifyArg::new().with_me(&bob));

    assert!(res.error().is_none());
    assert!(res.get_error().is_none());
    assert_eq!(res.key_diff(), Some(&TrackDiff::Unchanged));
    let quads = fp(0xaa).to_quads();
    let key_lines: Vec<&String> = res.messages().iter().filter(|m| m.contains(&quads)).collect();
    assert_eq!(key_lines.len(), 1);
    assert_eq!(
        key_lines[0],
        &format!("\u{2714} tracked public key fingerprint: {quads}")
    );
}

#[test]
fn changed_key_is_reported_as_clash() {
    let store = Arc::new(NullTrackingStore::new());
    store.put(statement(Some(fp(0x01)), Vec::new()));
    let ident = identifier(store);
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa)));
    let bob = viewer();

    let res = ident.identify(&alice, &IdentifyArg::new().with_me(&bob));

    assert_eq!(
        res.key_diff(),
        Some(&TrackDiff::Clash {
            expected: fp(0x01).to_quads()
        })
    );
    assert!(res.messages()[1].contains("CHANGED from"));
}

#[test]
fn anonymous_viewer_skips_tracking_lookup() {
    let store = Arc::new(NullTrackingStore::new());
    store.put(statement(Some(fp(0xaa)), Vec::new()));
    let ident = identifier(Arc::clone(&store));
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa)));

    let res = ident.identify(&alice, &IdentifyArg::new());

    assert_eq!(store.lookups(), 0);
    assert!(res.key_diff().is_none());
    assert!(!res.me_set());
    assert_eq!(res.messages().len(), 1);
}

#[test]
fn tracking_lookup_failure_aborts_and_is_not_cached() {
    let store = Arc::new(NullTrackingStore::new());
    store.fail_with(StoreError::Backend("disk on fire".into()));
    let ident = identifier(Arc::clone(&store));
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa)));
    let bob = viewer();
    let arg = IdentifyArg::new().with_me(&bob);

    let res = ident.identify(&alice, &arg);
    assert!(matches!(res.error(), Some(IdentifyError::TrackingLookup(_))));
    assert!(res.messages().is_empty());

    ident.identify(&alice, &arg);
    assert_eq!(store.lookups(), 2);
}

#[test]
fn second_identify_is_served_from_cache() {
    let store = Arc::new(NullTrackingStore::new());
    let ident = identifier(Arc::clone(&store));
    let table = Arc::new(CountingProofTable::new(EmptyProofTable));
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa))).with_id_table(table.clone());
    let bob = viewer();
    let (hook, seen) = recording_hook();
    let arg = IdentifyArg::new().with_me(&bob).with_report_hook(hook);

    let first = ident.identify(&alice, &arg);
    let calls_after_first = seen.lock().unwrap().len();
    let second = ident.identify(&alice, &arg);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(seen.lock().unwrap().len(), calls_after_first);
    assert_eq!(table.passes(), 1);
    assert_eq!(store.lookups(), 1);
    assert_eq!(ident.cache().hits(), 1);
}

#[test]
fn viewer_presence_never_shares_a_cache_entry() {
    let store = Arc::new(NullTrackingStore::new());
    let ident = identifier(store);
    let table = Arc::new(CountingProofTable::new(EmptyProofTable));
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa))).with_id_table(table.clone());
    let bob = viewer();

    let with_viewer = ident.identify(&alice, &IdentifyArg::new().with_me(&bob));
    let anonymous = ident.identify(&alice, &IdentifyArg::new());

    assert!(!Arc::ptr_eq(&with_viewer, &anonymous));
    assert!(with_viewer.me_set());
    assert!(!anonymous.me_set());
    assert_eq!(table.passes(), 2);
}

#[test]
fn invalidation_forces_a_new_pass() {
    let store = Arc::new(NullTrackingStore::new());
    let ident = identifier(store);
    let table = Arc::new(CountingProofTable::new(EmptyProofTable));
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa))).with_id_table(table.clone());

    let first = ident.identify(&alice, &IdentifyArg::new());
    assert_eq!(ident.cache().invalidate(alice.id()), 1);
    let second = ident.identify(&alice, &IdentifyArg::new());

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(table.passes(), 2);
}

#[test]
fn cache_ttl_expires_results() {
    let store = Arc::new(NullTrackingStore::new());
    let clock = Arc::new(NullClock::new(1_000));
    let ident = identifier(store).with_cache(IdentifyCache::new(clock.clone(), Some(300)));
    let table = Arc::new(CountingProofTable::new(EmptyProofTable));
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa))).with_id_table(table.clone());

    ident.identify(&alice, &IdentifyArg::new());
    clock.advance(299);
    ident.identify(&alice, &IdentifyArg::new());
    assert_eq!(table.passes(), 1);

    clock.advance(1);
    ident.identify(&alice, &IdentifyArg::new());
    assert_eq!(table.passes(), 2);
}

#[test]
fn concurrent_identifies_run_one_pass() {
    let store = Arc::new(NullTrackingStore::new());
    let ident = identifier(store);
    let table = Arc::new(CountingProofTable::new(EmptyProofTable));
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa))).with_id_table(table.clone());

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| ident.identify(&alice, &IdentifyArg::new())))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(table.passes(), 1);
    for r in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], r));
    }
    assert_eq!(ident.cache().flight_count(), 0);
}

#[test]
fn finished_identifies_leave_no_flight_locks() {
    let store = Arc::new(NullTrackingStore::new());
    let ident = identifier(store);
    let bob = viewer();

    for c in ['1', '2', '3'] {
        let user = User::new(uid(c), "someone", Some(fp(0xaa)));
        ident.identify(&user, &IdentifyArg::new());
        ident.identify(&user, &IdentifyArg::new().with_me(&bob));
    }
    // a failed pass goes through the same release path
    ident.identify(&User::new(uid('4'), "keyless", None), &IdentifyArg::new());

    assert_eq!(ident.cache().len(), 6);
    assert_eq!(ident.cache().flight_count(), 0);
}

#[test]
fn proof_pass_records_every_outcome_with_track_diffs() {
    let store = Arc::new(NullTrackingStore::new());
    store.put(statement(
        Some(fp(0xaa)),
        vec![
            tracked("github", "alice", ProofState::Ok),
            tracked("dns", "alice.example", ProofState::Ok),
            tracked("reddit", "alice", ProofState::Ok),
        ],
    ));
    let ident = identifier(store);
    let checkers: Vec<Arc<dyn ProofChecker>> = vec![
        Arc::new(FixedProof::passing("github", "alice")),
        Arc::new(FixedProof::failing(
            "dns",
            "alice.example",
            ProofError::Unreachable("timeout".into()),
        )),
        Arc::new(FixedProof::passing("twitter", "alice")),
    ];
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa)))
        .with_id_table(Arc::new(RemoteProofSet::new(checkers)));
    let bob = viewer();

    let res = ident.identify(&alice, &IdentifyArg::new().with_me(&bob));

    assert!(res.error().is_none());
    assert_eq!(res.proof_checks().len(), 4);
    // dns failed remotely, reddit was deleted.
    assert_eq!(res.num_proof_failures(), 2);
    assert_eq!(res.num_track_failures(), 2);

    let diff_of = |service: &str| {
        res.proof_checks()
            .iter()
            .find(|c| c.proof.service == service)
            .and_then(|c| c.diff.clone())
    };
    assert_eq!(diff_of("github"), Some(TrackDiff::Unchanged));
    assert_eq!(diff_of("dns"), Some(TrackDiff::RemoteFail));
    assert_eq!(diff_of("twitter"), Some(TrackDiff::New));
    assert_eq!(diff_of("reddit"), Some(TrackDiff::Deleted));

    assert_eq!(
        res.get_error().unwrap().to_string(),
        "PROBLEM: 2 proofs failed remote checks;2 track components failed"
    );
    let (lax, warnings) = res.get_error_lax();
    assert_eq!(lax.unwrap().to_string(), "2 track components failed");
    assert_eq!(warnings.len(), 1);

    // tracking line + key line + one line per outcome
    assert_eq!(res.messages().len(), 2 + 4);
}

#[test]
fn report_hook_sees_every_message_with_newline() {
    let store = Arc::new(NullTrackingStore::new());
    let ident = identifier(store);
    let checkers: Vec<Arc<dyn ProofChecker>> = vec![
        Arc::new(FixedProof::passing("github", "alice")),
        Arc::new(FixedProof::passing("hackernews", "alice")),
    ];
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa)))
        .with_id_table(Arc::new(RemoteProofSet::new(checkers)));
    let (hook, seen) = recording_hook();

    let res = ident.identify(&alice, &IdentifyArg::new().with_report_hook(hook));

    let expected: Vec<String> = res.messages().iter().map(|m| format!("{m}\n")).collect();
    assert_eq!(*seen.lock().unwrap(), expected);
    assert_eq!(res.messages().len(), 3);
}

#[test]
fn identify_simple_uses_strict_verdict_and_sink() {
    let store = Arc::new(NullTrackingStore::new());
    let sink = Arc::new(RecordingSink::new());
    let ident = Identifier::new(store, sink.clone());
    let checkers: Vec<Arc<dyn ProofChecker>> = vec![Arc::new(FixedProof::failing(
        "github",
        "alice",
        ProofError::NotFound("https://gist.github.com/alice".into()),
    ))];
    let alice = User::new(uid('a'), "alice", Some(fp(0xaa)))
        .with_id_table(Arc::new(RemoteProofSet::new(checkers)));

    let err = ident.identify_simple(&alice, None).unwrap_err();

    assert_eq!(err.to_string(), "PROBLEM: 1 proof failed remote checks");
    assert_eq!(sink.lines().len(), 2);
    assert!(sink.lines().iter().all(|l| l.ends_with('\n')));
}
