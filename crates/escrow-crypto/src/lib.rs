//! Cryptographic primitives for the escrow coordinator.
//!
//! Provides domain-separated BLAKE3 hashing, Ed25519 signing/verification,
//! and the deterministic record address derivation that pins every escrow
//! to its initializer.
//!
//! All crypto operations wrap established libraries.

pub mod derive;
pub mod hasher;
pub mod signer;

pub use derive::{AddressDeriver, DeriveError, DEFAULT_LABEL, ESCROW_PROGRAM_ID};
pub use hasher::ContentHasher;
pub use signer::{is_on_curve, verify, Keypair, Signature, SignatureError, TransitionSigner};
