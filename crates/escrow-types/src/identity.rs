use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{decode_hex32, TypeError};

/// Public identity of an escrow party.
///
/// An `Identity` is the raw 32-byte ed25519 public key of a party. The
/// coordinator never holds the matching secret; it only attaches identities
/// to transitions and compares them against stored record fields.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity([u8; 32]);

impl Identity {
    /// Text prefix accepted by [`Identity::from_hex`] and used by `short_id`.
    pub const PREFIX: &'static str = "id:";

    /// Create from raw public key bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build an identity from a slice, failing if it is not exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Random identity for tests and demos. Not backed by a key pair.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// The raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("{}{}", Self::PREFIX, hex::encode(&self.0[..4]))
    }

    /// Parse from a hex string (64 hex characters, optional `id:` prefix).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        decode_hex32(s, Self::PREFIX).map(Self)
    }
}

impl FromStr for Identity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.short_id())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
