use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;

use crate::validation::ValidationError;

/// A SHA-256 content hash, encoded as lowercase 64-hex.
///
/// This is the identity of an event (computed over its canonical bytes with
/// `signature` stripped) and the node/leaf value of the anchoring Merkle
/// tree. Construction always validates, so the hex form can be decoded to
/// raw bytes without failure paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Parses a validated content hash from its hex form.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if !Self::is_hex64(&value) {
            return Err(ValidationError::PatternMismatch {
                field: "contentHash",
                value,
            });
        }
        Ok(Self(value))
    }

    /// Hashes arbitrary bytes into a content hash.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Wraps a raw 32-byte digest.
    pub fn from_raw(raw: [u8; 32]) -> Self {
        Self(hex::encode(raw))
    }

    /// Returns the lowercase hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw 32-byte decoding of the hex hash.
    ///
    /// Ed25519 signatures are computed over these bytes, never over the hex
    /// text or the canonical JSON.
    pub fn to_raw(&self) -> [u8; 32] {
        let mut raw = [0u8; 32];
        let decoded = hex::decode(&self.0).expect("validated at construction");
        raw.copy_from_slice(&decoded);
        raw
    }

    /// Whether a string is exactly 64 lowercase hex characters.
    pub fn is_hex64(s: &str) -> bool {
        s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
