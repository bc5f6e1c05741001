//! Stable user identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypeError;

/// A stable user identifier: 32 lower-case hex digits.
///
/// Unlike a username it never changes, so tracking statements and cache
/// entries key on it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Number of hex digits in a user id.
    pub const HEX_LEN: usize = 32;

    /// Parse a user id, normalising to lower case.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypeError> {
        let s = raw.into().to_ascii_lowercase();
        if s.len() != Self::HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidUserId(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}
