use serde::{Deserialize, Serialize};

use escrow_ledger::{SignedTransition, TxOutcome};
use escrow_types::AddressRef;

pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// All message types exchanged with the settlement layer.
///
/// Every request carries a caller-chosen `request_id` that the matching
/// response echoes back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowMessage {
    SubmitRequest { request_id: u64, tx: SignedTransition },
    SubmitResponse { request_id: u64, outcome: TxOutcome },
    FetchRequest { request_id: u64, address: AddressRef },
    FetchResponse { request_id: u64, data: Option<Vec<u8>> },
    Error { request_id: u64, code: u32, message: String },
}

impl EscrowMessage {
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::SubmitRequest { .. } => 1,
            Self::SubmitResponse { .. } => 2,
            Self::FetchRequest { .. } => 3,
            Self::FetchResponse { .. } => 4,
            Self::Error { .. } => 255,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SubmitRequest { .. } => "SubmitRequest",
            Self::SubmitResponse { .. } => "SubmitResponse",
            Self::FetchRequest { .. } => "FetchRequest",
            Self::FetchResponse { .. } => "FetchResponse",
            Self::Error { .. } => "Error",
        }
    }

    pub fn request_id(&self) -> u64 {
        match self {
            Self::SubmitRequest { request_id, .. }
            | Self::SubmitResponse { request_id, .. }
            | Self::FetchRequest { request_id, .. }
            | Self::FetchResponse { request_id, .. }
            | Self::Error { request_id, .. } => *request_id,
        }
    }
}

pub mod error_codes {
    /// The request frame could not be decoded.
    pub const BAD_REQUEST: u32 = 400;
    /// The message was a response type sent as a request.
    pub const UNSUPPORTED: u32 = 405;
    /// The settlement layer could not serve the request right now.
    pub const UNAVAILABLE: u32 = 503;
}
