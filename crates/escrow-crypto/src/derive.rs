use escrow_types::{AddressRef, Bump, Identity};
use tracing::trace;

use crate::signer::is_on_curve;

/// Domain label shared by every escrow record address.
pub const DEFAULT_LABEL: &[u8] = b"escrow";

/// Program id of the deployed escrow settlement program.
pub const ESCROW_PROGRAM_ID: [u8; 32] = [
    0x2b, 0x6d, 0x96, 0xc5, 0x61, 0xc3, 0x2d, 0x83, 0xa3, 0x12, 0x73, 0x6e, 0xe2, 0x46, 0x22, 0x11,
    0x0b, 0x5a, 0xa9, 0xbf, 0xa3, 0x00, 0xbe, 0xc7, 0xc4, 0x26, 0x23, 0x58, 0x9d, 0x0d, 0x7b, 0xd6,
];

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";
const MAX_LABEL_LEN: usize = 32;

/// Derives the canonical record address for an initializer.
///
/// The address is `BLAKE3(label || initializer || bump || program_id || marker)`
/// for the highest bump whose output is not an ed25519 point. Because the
/// result is off-curve, no key pair can sign for it, and because the bump is
/// searched deterministically, callers cannot pick a different address for
/// the same initializer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: [u8; 32],
    label: Vec<u8>,
}

impl AddressDeriver {
    /// Create a deriver for a program id and domain label.
    pub fn new(program_id: [u8; 32], label: impl Into<Vec<u8>>) -> Result<Self, DeriveError> {
        let label = label.into();
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(DeriveError::InvalidLabel(label.len()));
        }
        Ok(Self { program_id, label })
    }

    pub fn program_id(&self) -> &[u8; 32] {
        &self.program_id
    }

    pub fn label(&self) -> &[u8] {
        &self.label
    }

    /// Derive `(address, bump)` from raw initializer bytes.
    ///
    /// Fails if `initializer` is not exactly 32 bytes. Never substitutes a
    /// fallback address.
    pub fn derive(&self, initializer: &[u8]) -> Result<(AddressRef, Bump), DeriveError> {
        let initializer = Identity::from_slice(initializer)
            .map_err(|_| DeriveError::InvalidInitializer(initializer.len()))?;
        self.derive_identity(&initializer)
    }

    /// Derive `(address, bump)` for a parsed identity.
    pub fn derive_identity(&self, initializer: &Identity) -> Result<(AddressRef, Bump), DeriveError> {
        for bump in (0..=u8::MAX).rev() {
            let candidate = self.candidate(initializer, bump);
            if !is_on_curve(&candidate) {
                trace!(initializer = %initializer.short_id(), bump, "derived record address");
                return Ok((AddressRef::from_bytes(candidate), Bump(bump)));
            }
        }
        Err(DeriveError::NoViableBump)
    }

    /// Whether `(address, bump)` is the canonical derivation for `initializer`.
    pub fn verify(&self, initializer: &Identity, address: &AddressRef, bump: Bump) -> bool {
        matches!(self.derive_identity(initializer), Ok((a, b)) if a == *address && b == bump)
    }

    fn candidate(&self, initializer: &Identity, bump: u8) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.label);
        hasher.update(initializer.as_bytes());
        hasher.update(&[bump]);
        hasher.update(&self.program_id);
        hasher.update(PDA_MARKER);
        *hasher.finalize().as_bytes()
    }
}

impl Default for AddressDeriver {
    fn default() -> Self {
        Self {
            program_id: ESCROW_PROGRAM_ID,
            label: DEFAULT_LABEL.to_vec(),
        }
    }
}

/// Errors from address derivation.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DeriveError {
    #[error("initializer must be 32 bytes, got {0}")]
    InvalidInitializer(usize),

    #[error("domain label must be 1..=32 bytes, got {0}")]
    InvalidLabel(usize),

    #[error("no bump yields an off-curve address")]
    NoViableBump,
}
