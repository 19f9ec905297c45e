//! Settlement journal.
//!
//! A record's absence is the only authoritative terminal state, and it looks
//! the same after a claim as after a cancel. The journal keeps the missing
//! half of the story: an append-only log of every accepted transition, kept
//! next to (never inside) the records themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

use escrow_types::{AddressRef, Identity};

use crate::outcome::TxId;

/// Which transition an event records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementKind {
    Created,
    Claimed,
    Cancelled,
}

impl SettlementKind {
    /// Whether this event removed the record.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Created)
    }
}

impl fmt::Display for SettlementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Claimed => write!(f, "claimed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One accepted transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEvent {
    /// Position in the journal (1-based, monotonic).
    pub seq: u64,
    pub tx_id: TxId,
    pub address: AddressRef,
    pub kind: SettlementKind,
    /// Identity that authorized the transition.
    pub actor: Identity,
    /// Escrowed amount moved by the transition.
    pub amount: u64,
}

/// Append-only log of settlement events.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    events: Vec<SettlementEvent>,
}

impl Journal {
    /// Append an event and return it with its assigned sequence number.
    pub fn append(
        &mut self,
        tx_id: TxId,
        address: AddressRef,
        kind: SettlementKind,
        actor: Identity,
        amount: u64,
    ) -> &SettlementEvent {
        let seq = self.events.len() as u64 + 1;
        self.events.push(SettlementEvent {
            seq,
            tx_id,
            address,
            kind,
            actor,
            amount,
        });
        &self.events[self.events.len() - 1]
    }

    /// All events for one address, oldest first.
    pub fn for_address(&self, address: &AddressRef) -> Vec<SettlementEvent> {
        self.events
            .iter()
            .filter(|e| e.address == *address)
            .cloned()
            .collect()
    }

    /// How the most recent escrow at `address` ended, if it has ended.
    pub fn last_terminal(&self, address: &AddressRef) -> Option<SettlementKind> {
        match self.events.iter().rev().find(|e| e.address == *address) {
            Some(event) if event.kind.is_terminal() => Some(event.kind),
            _ => None,
        }
    }
}
