//! Classification of how live state compares to a tracking statement.

use serde::Serialize;
use std::fmt;

/// How a key or proof compares to what the viewer tracked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackDiff {
    /// Same as when tracked.
    Unchanged,
    /// Not present in the tracking statement.
    New,
    /// A different key than the tracked one. `expected` is the tracked
    /// value, rendered for display.
    Clash { expected: String },
    /// Tracked as working, now failing.
    RemoteFail,
    /// Tracked as failing, now working.
    RemoteWorking,
    /// Tracked, but no longer claimed by the subject.
    Deleted,
}

impl TrackDiff {
    /// Whether this change contradicts the trust the viewer recorded.
    pub fn breaks_tracking(&self) -> bool {
        matches!(self, Self::Clash { .. } | Self::RemoteFail | Self::Deleted)
    }

    /// Short token shown in front of narration lines.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Unchanged => "tracked".to_string(),
            Self::New => "new".to_string(),
            Self::Clash { expected } => format!("CHANGED from \"{expected}\""),
            Self::RemoteFail => "remote failed".to_string(),
            Self::RemoteWorking => "newly working".to_string(),
            Self::Deleted => "deleted".to_string(),
        }
    }
}

impl fmt::Display for TrackDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}
