use serde::{Deserialize, Serialize};

/// Local failures while building or encoding ledger requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("balance of {0} would overflow")]
    BalanceOverflow(String),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl From<TransportError> for LedgerError {
    fn from(err: TransportError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Why the settlement layer definitively refused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum RejectReason {
    #[error("an active escrow already exists at this address")]
    AlreadyExists,

    #[error("no active escrow at this address")]
    NotFound,

    #[error("caller is not authorized for this transition")]
    Unauthorized,

    #[error("insufficient funds to cover amount and storage overhead")]
    InsufficientFunds,

    #[error("amount must be at least 1")]
    InvalidAmount,

    #[error("address is not the canonical derivation for the initializer")]
    InvalidAddress,

    #[error("transition was already processed")]
    Duplicate,

    #[error("payout would overflow the recipient balance")]
    Overflow,
}

/// Failures below the escrow layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request may or may not have been applied.
    #[error("timed out waiting for the ledger")]
    Timeout,

    #[error("connection failure: {0}")]
    Connection(String),

    #[error("protocol failure: {0}")]
    Protocol(String),
}
