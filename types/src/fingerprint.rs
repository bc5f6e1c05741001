//! PGP key fingerprint type and its human-comparable rendering.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// A 20-byte PGP v4 key fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PgpFingerprint([u8; 20]);

impl PgpFingerprint {
    /// Length of a fingerprint in bytes.
    pub const LEN: usize = 20;

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a fingerprint from hex. Whitespace is ignored, so the quads
    /// rendering parses back to the same fingerprint.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.len() != Self::LEN * 2 {
            return Err(TypeError::InvalidFingerprint {
                reason: format!("expected {} hex digits, got {}", Self::LEN * 2, compact.len()),
            });
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(&compact, &mut bytes).map_err(|e| TypeError::InvalidFingerprint {
            reason: e.to_string(),
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lower-case hex, no separators.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Upper-case hex in groups of four separated by single spaces,
    /// e.g. `0123 4567 89AB ...`. Used verbatim in narration and errors.
    pub fn to_quads(&self) -> String {
        let upper = hex::encode_upper(self.0);
        let mut out = String::with_capacity(upper.len() * 5 / 4);
        for (i, c) in upper.chars().enumerate() {
            if i > 0 && i % 4 == 0 {
                out.push(' ');
            }
            out.push(c);
        }
        out
    }
}

impl fmt::Debug for PgpFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PgpFingerprint({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for PgpFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for PgpFingerprint {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PgpFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PgpFingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FingerprintVisitor;

        impl<'de> serde::de::Visitor<'de> for FingerprintVisitor {
            type Value = PgpFingerprint;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a 40 digit hex fingerprint")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                PgpFingerprint::from_hex(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(FingerprintVisitor)
    }
}
