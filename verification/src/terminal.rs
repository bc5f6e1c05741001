//! Terminal-facing collaborators: narration output and confirmation prompts.

use crate::PromptError;

/// Where narration goes for the user to read.
pub trait NarrationSink: Send + Sync {
    fn output(&self, text: &str);
}

/// Asks the user a yes/no question.
pub trait Prompter: Send + Sync {
    /// `Ok(())` means the user accepted.
    fn prompt_for_confirmation(&self, prompt: &str) -> Result<(), PromptError>;
}

/// Drops all narration.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardSink;

impl NarrationSink for DiscardSink {
    fn output(&self, _text: &str) {}
}
