use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{decode_hex32, TypeError};

/// Storage address of an escrow record.
///
/// Addresses are never chosen by callers. They are derived from the
/// initializer's identity and a fixed domain label, so the address itself
/// acts as the record's identity key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressRef([u8; 32]);

impl AddressRef {
    pub const PREFIX: &'static str = "esc:";

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("{}{}", Self::PREFIX, hex::encode(&self.0[..4]))
    }

    /// Parse from a hex string (64 hex characters, optional `esc:` prefix).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        decode_hex32(s, Self::PREFIX).map(Self)
    }
}

impl FromStr for AddressRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for AddressRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AddressRef({})", self.short_id())
    }
}

impl fmt::Display for AddressRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Derivation discriminant for a record address.
///
/// The bump is the first value, counting down from 255, for which the
/// derived address falls off the ed25519 curve. Shipping it with the
/// address proves the address has no private key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bump(pub u8);

impl Bump {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_and_bare_hex_parse_the_same() {
        let addr = AddressRef::from_bytes([3; 32]);
        let bare = AddressRef::from_hex(&addr.to_hex()).unwrap();
        let prefixed: AddressRef = format!("esc:{}", addr.to_hex()).parse().unwrap();
        assert_eq!(bare, prefixed);
        assert_eq!(bare, addr);
    }

    #[test]
    fn short_id_has_prefix() {
        let addr = AddressRef::from_bytes([0xff; 32]);
        assert_eq!(addr.short_id(), "esc:ffffffff");
    }

    #[test]
    fn bump_display() {
        assert_eq!(Bump(254).to_string(), "254");
        assert_eq!(Bump(9).value(), 9);
    }
}
