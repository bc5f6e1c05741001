//! The key-fingerprint step of a verification pass.

use crate::session::CHECK;
use crate::{IdentifyError, IdentifySession};

/// Check the subject's active key and narrate it, diffed against the
/// tracked key when the viewer tracked the subject before.
///
/// A missing key is a data problem, not a transient fault: the error
/// aborts the pass and is not retried.
pub fn identify_key(session: &IdentifySession<'_>) -> Result<(), IdentifyError> {
    let fingerprint = session.subject().get_active_pgp_fingerprint()?;

    let mut guard = session.lock();
    let mut prefix = String::new();
    if let Some(track) = session.track() {
        let diff = track.compute_key_diff(&fingerprint);
        prefix = format!("{} ", diff.to_display_string());
        guard.set_key_diff(diff);
    }
    guard.report(format!(
        "{CHECK} {prefix}public key fingerprint: {}",
        fingerprint.to_quads()
    ));
    Ok(())
}
