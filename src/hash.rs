//! Digest type and hash transform
//!
//! The engine treats the hash as an opaque primitive: bytes in, 160-bit
//! digest out, rendered as 40 lowercase hex characters. The transform is
//! standard SHA-1, so blob digests match any reference implementation.

use crate::error::RelicError;
use sha1::{Digest as _, Sha1};
use std::fmt;

/// A 160-bit content digest (20 bytes).
///
/// Identifies content, never identity-of-location: the same bytes always
/// produce the same digest regardless of where they are stored.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    /// Create an ObjectId from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the digest as a byte slice.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Render as 40 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 40-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, RelicError> {
        if s.len() != 40 {
            return Err(RelicError::Malformed(format!(
                "invalid digest length: expected 40 hex characters, got {}",
                s.len()
            )));
        }
        let raw = hex::decode(s)
            .map_err(|_| RelicError::Malformed(format!("invalid digest: {}", s)))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }

    /// Abbreviated form for human-facing output (first 7 hex chars).
    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

/// Hash arbitrary bytes into a digest.
pub fn hash_bytes(data: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(data);
    ObjectId(hasher.finalize().into())
}
