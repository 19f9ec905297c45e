use std::collections::{HashMap, HashSet};

use escrow_crypto::AddressDeriver;
use escrow_types::{AddressRef, Bump, EscrowRecord, Identity, Role};

use crate::config::LedgerConfig;
use crate::error::RejectReason;
use crate::journal::SettlementKind;
use crate::transition::{SignedTransition, Transition};

/// A live record account: the record plus the value it holds in custody.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub record: EscrowRecord,
    /// Escrowed amount plus storage overhead.
    pub lamports: u64,
}

/// Authoritative ledger contents the state machine mutates.
#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    pub accounts: HashMap<AddressRef, Account>,
    pub balances: HashMap<Identity, u64>,
    processed: HashSet<[u8; 32]>,
}

impl LedgerState {
    pub fn balance(&self, identity: &Identity) -> u64 {
        self.balances.get(identity).copied().unwrap_or(0)
    }

    /// Balance of `identity` after receiving `amount`, if it fits.
    fn credited(&self, identity: &Identity, amount: u64) -> Option<u64> {
        self.balance(identity).checked_add(amount)
    }
}

/// Effect of one accepted transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub kind: SettlementKind,
    pub address: AddressRef,
    pub actor: Identity,
    /// Escrowed amount moved.
    pub amount: u64,
    /// Storage overhead allocated or released alongside it.
    pub overhead: u64,
}

/// The escrow lifecycle rules: `NonExistent -> Active -> NonExistent`.
///
/// `apply` is all-or-nothing: on rejection `state` is left untouched.
/// Callers serialize access to `state`; the machine itself holds none.
#[derive(Clone, Debug, Default)]
pub struct EscrowStateMachine {
    config: LedgerConfig,
    deriver: AddressDeriver,
}

impl EscrowStateMachine {
    pub fn new(config: LedgerConfig, deriver: AddressDeriver) -> Self {
        Self { config, deriver }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    /// Validate and apply one signed transition.
    pub fn apply(
        &self,
        state: &mut LedgerState,
        tx: &SignedTransition,
    ) -> Result<Settlement, RejectReason> {
        if tx.signer != *tx.transition.actor() || tx.verify().is_err() {
            return Err(RejectReason::Unauthorized);
        }
        let replay_key = tx.replay_key();
        if state.processed.contains(&replay_key) {
            return Err(RejectReason::Duplicate);
        }

        let settlement = match &tx.transition {
            Transition::Create {
                initializer,
                taker,
                amount,
                address,
                bump,
            } => self.create(state, initializer, taker, *amount, address, *bump)?,
            Transition::Claim { address, caller } | Transition::Cancel { address, caller } => {
                self.close(state, address, caller, tx.transition.required_role())?
            }
        };

        state.processed.insert(replay_key);
        Ok(settlement)
    }

    fn create(
        &self,
        state: &mut LedgerState,
        initializer: &Identity,
        taker: &Identity,
        amount: u64,
        address: &AddressRef,
        bump: Bump,
    ) -> Result<Settlement, RejectReason> {
        let record = EscrowRecord::new(*initializer, *taker, amount)
            .map_err(|_| RejectReason::InvalidAmount)?;
        if !self.deriver.verify(initializer, address, bump) {
            return Err(RejectReason::InvalidAddress);
        }
        if state.accounts.contains_key(address) {
            return Err(RejectReason::AlreadyExists);
        }

        let overhead = self.config.record_overhead();
        let cost = amount
            .checked_add(overhead)
            .ok_or(RejectReason::InsufficientFunds)?;
        let balance = state.balance(initializer);
        if balance < cost {
            return Err(RejectReason::InsufficientFunds);
        }

        state.balances.insert(*initializer, balance - cost);
        state.accounts.insert(
            *address,
            Account {
                record,
                lamports: cost,
            },
        );

        Ok(Settlement {
            kind: SettlementKind::Created,
            address: *address,
            actor: *initializer,
            amount,
            overhead,
        })
    }

    /// Claim and cancel differ only in the role the caller must hold.
    fn close(
        &self,
        state: &mut LedgerState,
        address: &AddressRef,
        caller: &Identity,
        role: Role,
    ) -> Result<Settlement, RejectReason> {
        let account = state.accounts.get(address).ok_or(RejectReason::NotFound)?;
        if !role.permits(&account.record, caller) {
            return Err(RejectReason::Unauthorized);
        }

        let new_balance = state
            .credited(caller, account.lamports)
            .ok_or(RejectReason::Overflow)?;

        let Some(account) = state.accounts.remove(address) else {
            return Err(RejectReason::NotFound);
        };
        state.balances.insert(*caller, new_balance);

        let kind = match role {
            Role::Taker => SettlementKind::Claimed,
            Role::Initializer => SettlementKind::Cancelled,
        };
        Ok(Settlement {
            kind,
            address: *address,
            actor: *caller,
            amount: account.record.amount(),
            overhead: account.lamports.saturating_sub(account.record.amount()),
        })
    }
}
