use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::record::EscrowRecord;

/// The two parties an escrow recognises.
///
/// Authorization is identity match against the record field named by the
/// role. There are no other roles and no ACLs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Funded the escrow; may cancel it.
    Initializer,
    /// Named counterparty; may claim it.
    Taker,
}

impl Role {
    /// The identity holding this role on `record`.
    pub fn holder(&self, record: &EscrowRecord) -> Identity {
        match self {
            Self::Initializer => record.initializer(),
            Self::Taker => record.taker(),
        }
    }

    /// Whether `caller` holds this role on `record`.
    pub fn permits(&self, record: &EscrowRecord, caller: &Identity) -> bool {
        self.holder(record) == *caller
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializer => write!(f, "initializer"),
            Self::Taker => write!(f, "taker"),
        }
    }
}
