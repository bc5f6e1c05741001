//! Self-verification: confirm the identity service's key for the local user
//! before trusting it locally.

use keyproof_store::ConfigStore;
use tracing::{info, warn};

use crate::{IdentifyArg, IdentifyError, Identifier, Prompter, User};

const PROMPT_DESPITE_WARNINGS: &str = "Do you still accept these credentials to be your own?";
const PROMPT_NO_PROOFS: &str =
    "We found your account, but you have no hosted proofs. Check your fingerprint carefully. Is this you?";
const PROMPT_PLAIN: &str = "Is this you?";

/// Checks the locally configured fingerprint against the identity service.
pub struct SelfVerifier<'a> {
    identifier: &'a Identifier,
    config: &'a dyn ConfigStore,
    prompter: Option<&'a dyn Prompter>,
}

impl<'a> SelfVerifier<'a> {
    /// `prompter` is `None` when there is no interactive surface.
    pub fn new(
        identifier: &'a Identifier,
        config: &'a dyn ConfigStore,
        prompter: Option<&'a dyn Prompter>,
    ) -> Self {
        Self {
            identifier,
            config,
            prompter,
        }
    }

    /// Verify that `me`'s key as reported by the service is the one the
    /// local user accepts.
    ///
    /// A configured fingerprint must match exactly. With none configured
    /// the user verifies themselves interactively and, on acceptance, the
    /// service's fingerprint is persisted. `background` callers never get
    /// prompted.
    pub fn identify_self(&self, me: &User, background: bool) -> Result<(), IdentifyError> {
        let target = me.get_active_pgp_fingerprint()?;

        match self.config.pgp_fingerprint().map_err(IdentifyError::ConfigRead)? {
            Some(configured) if configured == target => return Ok(()),
            Some(configured) => {
                return Err(IdentifyError::WrongKey {
                    configured,
                    expected: target,
                })
            }
            None => {}
        }

        let prompter = match self.prompter {
            Some(p) if !background => p,
            _ => {
                return Err(IdentifyError::NeedInput(
                    "Can't verify your key fingerprint; try logging in again".to_string(),
                ))
            }
        };

        info!("Verifying your key fingerprint....");

        let arg = IdentifyArg::new()
            .with_me(me)
            .with_report_hook(self.identifier.report_hook());
        let ires = self.identifier.identify(me, &arg);

        let (err, warnings) = ires.get_error_lax();
        if let Some(err) = err {
            return Err(err);
        }

        let prompt = if !warnings.is_empty() {
            warnings.warn();
            for w in &warnings {
                self.identifier.sink().output(&format!("{w}\n"));
            }
            PROMPT_DESPITE_WARNINGS
        } else if ires.proof_checks().is_empty() {
            PROMPT_NO_PROOFS
        } else {
            PROMPT_PLAIN
        };

        prompter.prompt_for_confirmation(prompt)?;

        warn!("Setting PGP fingerprint to: {}", target.to_quads());
        self.config
            .set_pgp_fingerprint(&target)
            .map_err(IdentifyError::ConfigWrite)
    }
}
