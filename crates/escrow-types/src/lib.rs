//! Foundation types for the escrow coordinator.
//!
//! Every other escrow crate depends on `escrow-types`. The types here carry
//! no behaviour beyond parsing, display, and the fixed record layout.
//!
//! # Key Types
//!
//! - [`Identity`]: 32-byte ed25519 public key of a party
//! - [`AddressRef`]: deterministic storage address of an escrow record
//! - [`Bump`]: derivation discriminant proving an address is program-derived
//! - [`EscrowRecord`]: the sole persistent entity, with its binary layout
//! - [`Role`]: the two parties an escrow recognises

pub mod address;
pub mod error;
pub mod identity;
pub mod record;
pub mod role;

pub use address::{AddressRef, Bump};
pub use error::TypeError;
pub use identity::Identity;
pub use record::{EscrowRecord, RECORD_LEN};
pub use role::Role;
