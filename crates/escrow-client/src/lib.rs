//! Client side of the escrow settlement boundary.
//!
//! [`LedgerClient`] wraps any [`escrow_ledger::LedgerTransport`], bounds every
//! submission by the configured confirmation timeout and turns ledger
//! outcomes and raw account bytes into typed results.

pub mod client;
pub mod config;
pub mod error;

pub use client::LedgerClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
