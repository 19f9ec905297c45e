use escrow_client::ClientError;
use escrow_ledger::RejectReason;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    /// Caller input was malformed. Never reaches the ledger.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("caller is not authorized for this escrow")]
    Unauthorized,

    #[error("an active escrow already exists for this initializer")]
    AlreadyExists,

    #[error("no active escrow at this address")]
    NotFound,

    #[error("insufficient funds to cover amount and storage overhead")]
    InsufficientFunds,

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The outcome is unknown. Look the escrow up again before acting.
    #[error("submission unconfirmed: outcome unknown")]
    Unconfirmed,

    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Definitive ledger rejection outside the taxonomy above.
    #[error("rejected by ledger: {0}")]
    Rejected(String),
}

impl EscrowError {
    /// `false` only when the transition may still have been applied.
    pub fn is_definitive(&self) -> bool {
        !matches!(self, Self::Unconfirmed)
    }
}

impl From<RejectReason> for EscrowError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::AlreadyExists => Self::AlreadyExists,
            RejectReason::NotFound => Self::NotFound,
            RejectReason::Unauthorized => Self::Unauthorized,
            RejectReason::InsufficientFunds => Self::InsufficientFunds,
            RejectReason::InvalidAmount => Self::InvalidInput(reason.to_string()),
            RejectReason::InvalidAddress | RejectReason::Duplicate | RejectReason::Overflow => {
                Self::Rejected(reason.to_string())
            }
        }
    }
}

impl From<ClientError> for EscrowError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Rejected(reason) => reason.into(),
            ClientError::Unconfirmed => Self::Unconfirmed,
            ClientError::Transport(msg) => Self::TransportFailure(msg),
            ClientError::MalformedRecord(msg) => Self::MalformedRecord(msg),
            ClientError::Config(msg) => Self::InvalidInput(msg),
        }
    }
}

pub type EscrowResult<T> = Result<T, EscrowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unconfirmed_is_indefinite() {
        assert!(!EscrowError::Unconfirmed.is_definitive());
        assert!(EscrowError::NotFound.is_definitive());
        assert!(EscrowError::TransportFailure("reset".into()).is_definitive());
    }

    #[test]
    fn reject_reasons_map_onto_taxonomy() {
        assert_eq!(EscrowError::from(RejectReason::NotFound), EscrowError::NotFound);
        assert_eq!(EscrowError::from(RejectReason::Unauthorized), EscrowError::Unauthorized);
        assert_eq!(EscrowError::from(RejectReason::AlreadyExists), EscrowError::AlreadyExists);
        assert_eq!(
            EscrowError::from(RejectReason::InsufficientFunds),
            EscrowError::InsufficientFunds
        );
        assert!(matches!(
            EscrowError::from(RejectReason::Duplicate),
            EscrowError::Rejected(_)
        ));
        assert!(matches!(
            EscrowError::from(RejectReason::Overflow),
            EscrowError::Rejected(_)
        ));
    }

    #[test]
    fn client_errors_keep_their_kind() {
        assert_eq!(EscrowError::from(ClientError::Unconfirmed), EscrowError::Unconfirmed);
        assert!(matches!(
            EscrowError::from(ClientError::MalformedRecord("short".into())),
            EscrowError::MalformedRecord(_)
        ));
        assert!(matches!(
            EscrowError::from(ClientError::Transport("down".into())),
            EscrowError::TransportFailure(_)
        ));
    }
}
