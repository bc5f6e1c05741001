//! Nullable narration sink: captures output instead of printing it.

use keyproof_verification::NarrationSink;
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, one entry per `output` call.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl NarrationSink for RecordingSink {
    fn output(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}
