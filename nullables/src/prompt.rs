//! Nullable prompter: scripted answers, recorded questions.

use keyproof_verification::{PromptError, Prompter};
use std::sync::Mutex;

/// Answers every confirmation the same way and records the prompts.
pub struct NullPrompter {
    answer: Result<(), PromptError>,
    prompts: Mutex<Vec<String>>,
}

impl NullPrompter {
    pub fn accepting() -> Self {
        Self::answering(Ok(()))
    }

    pub fn rejecting() -> Self {
        Self::answering(Err(PromptError::Rejected))
    }

    pub fn answering(answer: Result<(), PromptError>) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts shown so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Prompter for NullPrompter {
    fn prompt_for_confirmation(&self, prompt: &str) -> Result<(), PromptError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer.clone()
    }
}
