//! Content fingerprinting for document change detection.
//!
//! A fingerprint is the first 8 hex characters of the SHA-256 digest of
//! a document's canonical JSON serialization. It exists purely so the
//! sync layer can ask "is this the same content I last applied?" -- it
//! is not a security boundary.

use std::fmt;

use sha2::{Digest, Sha256};

use super::serialization::SceneDocument;

/// Width of a fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentFingerprint([u8; FINGERPRINT_LEN]);

impl ContentFingerprint {
    /// Fingerprint of a document's canonical serialization. Two
    /// documents with equal content always hash equally regardless of
    /// the whitespace or key layout of the text they were parsed from.
    pub fn of_document(doc: &SceneDocument) -> Result<Self, serde_json::Error> {
        let canonical = serde_json::to_string(doc)?;
        Ok(Self::of_bytes(canonical.as_bytes()))
    }

    fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut out = [0u8; FINGERPRINT_LEN];
        for (i, byte) in digest[..FINGERPRINT_LEN / 2].iter().enumerate() {
            out[i * 2] = HEX[(byte >> 4) as usize];
            out[i * 2 + 1] = HEX[(byte & 0x0f) as usize];
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        // always ASCII hex
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
