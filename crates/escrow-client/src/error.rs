use escrow_ledger::RejectReason;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The ledger definitively refused the transition.
    #[error("rejected by ledger: {0}")]
    Rejected(RejectReason),

    /// No definitive outcome arrived in time. The transition may still land.
    #[error("submission outcome unknown: no confirmation within the timeout")]
    Unconfirmed,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
