//! Escrow settlement contract for the escrow coordinator.
//!
//! This crate describes what the remote settlement layer guarantees and
//! provides a faithful in-process implementation of it:
//! - [`Transition`] / [`SignedTransition`] request types and their signing message
//! - [`TxOutcome`] / [`RejectReason`] results of a submission
//! - the [`LedgerTransport`] trait boundary the client depends on
//! - [`EscrowStateMachine`], the authorization and settlement rules
//! - [`InMemoryLedger`], an atomic fake ledger for tests and embedding
//! - a settlement [`Journal`] recording which terminal transition occurred

pub mod config;
pub mod error;
pub mod journal;
pub mod machine;
pub mod memory;
pub mod outcome;
pub mod traits;
pub mod transition;

pub use config::LedgerConfig;
pub use error::{LedgerError, RejectReason, TransportError};
pub use journal::{Journal, SettlementEvent, SettlementKind};
pub use machine::{Account, EscrowStateMachine, LedgerState, Settlement};
pub use memory::InMemoryLedger;
pub use outcome::{TxId, TxOutcome};
pub use traits::LedgerTransport;
pub use transition::{SignedTransition, Transition};
