//! Stdout narration and stdin confirmation.

use std::io::{self, BufRead, Write};

use keyproof_verification::{NarrationSink, PromptError, Prompter};

/// Prints narration to stdout as it arrives.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl NarrationSink for StdoutSink {
    fn output(&self, text: &str) {
        let mut out = io::stdout().lock();
        // A closed stdout only loses narration.
        let _ = out.write_all(text.as_bytes()).and_then(|()| out.flush());
    }
}

/// Asks on stdout, answers from stdin. Anything but yes is a rejection.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt_for_confirmation(&self, prompt: &str) -> Result<(), PromptError> {
        let mut out = io::stdout().lock();
        write!(out, "{prompt} [y/N] ")
            .and_then(|()| out.flush())
            .map_err(|e| PromptError::Io(e.to_string()))?;
        drop(out);

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .map_err(|e| PromptError::Io(e.to_string()))?;

        if is_yes(&answer) {
            Ok(())
        } else {
            Err(PromptError::Rejected)
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
