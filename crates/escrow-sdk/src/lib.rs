//! High-level SDK for two-party escrows.
//!
//! [`EscrowCoordinator`] is the entry point: it validates caller input,
//! resolves canonical escrow addresses through an [`EscrowDirectory`],
//! signs transitions with the caller's [`TransitionSigner`] and maps ledger
//! outcomes onto [`EscrowError`].

pub mod coordinator;
pub mod directory;
pub mod error;

pub use coordinator::EscrowCoordinator;
pub use directory::{EscrowDirectory, EscrowSlot};
pub use error::{EscrowError, EscrowResult};

// Re-export key types
pub use escrow_client::{ClientConfig, LedgerClient};
pub use escrow_crypto::{AddressDeriver, Keypair, TransitionSigner};
pub use escrow_ledger::{InMemoryLedger, LedgerTransport, SettlementKind};
pub use escrow_types::{AddressRef, Bump, EscrowRecord, Identity, Role};
