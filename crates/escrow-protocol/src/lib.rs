//! Wire protocol for talking to the escrow settlement layer.
//!
//! Defines the framing and message types exchanged between the ledger
//! client and a settlement service, and a tokio channel service that
//! answers framed requests against an [`escrow_ledger::InMemoryLedger`].

pub mod channel;
pub mod codec;
pub mod error;
pub mod message;

pub use channel::{ChannelTransport, LedgerService};
pub use codec::EscrowCodec;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{error_codes, EscrowMessage, MAX_MESSAGE_SIZE};
