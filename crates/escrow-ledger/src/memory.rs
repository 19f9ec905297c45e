use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{debug, info};

use escrow_crypto::AddressDeriver;
use escrow_types::{AddressRef, EscrowRecord, Identity};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, TransportError};
use crate::journal::{Journal, SettlementEvent, SettlementKind};
use crate::machine::{EscrowStateMachine, LedgerState};
use crate::outcome::TxOutcome;
use crate::traits::LedgerTransport;
use crate::transition::SignedTransition;

/// In-memory settlement layer for tests, local demos, and embedding.
///
/// Every submission runs under one write lock, so concurrent transitions
/// against the same record race exactly as they would on the real ledger:
/// one wins, the others observe the post-state.
pub struct InMemoryLedger {
    machine: EscrowStateMachine,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    state: LedgerState,
    journal: Journal,
}

impl InMemoryLedger {
    pub fn new(config: LedgerConfig, deriver: AddressDeriver) -> Self {
        Self {
            machine: EscrowStateMachine::new(config, deriver),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn machine(&self) -> &EscrowStateMachine {
        &self.machine
    }

    /// Credit `identity` out of thin air. Test and demo faucet.
    pub fn airdrop(&self, identity: &Identity, amount: u64) -> Result<u64, LedgerError> {
        let mut inner = self.write()?;
        let balance = inner
            .state
            .balance(identity)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow(identity.short_id()))?;
        inner.state.balances.insert(*identity, balance);
        debug!(identity = %identity.short_id(), amount, "airdrop");
        Ok(balance)
    }

    pub fn balance(&self, identity: &Identity) -> Result<u64, TransportError> {
        Ok(self.read()?.state.balance(identity))
    }

    /// Decoded record at `address`, bypassing the byte-level transport.
    pub fn record(&self, address: &AddressRef) -> Result<Option<EscrowRecord>, TransportError> {
        Ok(self
            .read()?
            .state
            .accounts
            .get(address)
            .map(|account| account.record))
    }

    /// Value held in custody by the record at `address`.
    pub fn custody(&self, address: &AddressRef) -> Result<Option<u64>, TransportError> {
        Ok(self
            .read()?
            .state
            .accounts
            .get(address)
            .map(|account| account.lamports))
    }

    pub fn active_count(&self) -> Result<usize, TransportError> {
        Ok(self.read()?.state.accounts.len())
    }

    /// Settlement events for `address`, oldest first.
    pub fn history(&self, address: &AddressRef) -> Result<Vec<SettlementEvent>, TransportError> {
        Ok(self.read()?.journal.for_address(address))
    }

    /// How the last escrow at `address` ended, or `None` while it is active.
    pub fn settlement_of(
        &self,
        address: &AddressRef,
    ) -> Result<Option<SettlementKind>, TransportError> {
        Ok(self.read()?.journal.last_terminal(address))
    }

    /// Apply a transition synchronously.
    pub fn apply(&self, tx: &SignedTransition) -> Result<TxOutcome, TransportError> {
        let mut inner = self.write()?;
        let Inner { state, journal } = &mut *inner;

        match self.machine.apply(state, tx) {
            Ok(settlement) => {
                let tx_id = tx.tx_id();
                let event = journal.append(
                    tx_id,
                    settlement.address,
                    settlement.kind,
                    settlement.actor,
                    settlement.amount,
                );
                info!(
                    seq = event.seq,
                    kind = %event.kind,
                    address = %event.address.short_id(),
                    actor = %event.actor.short_id(),
                    amount = event.amount,
                    overhead = settlement.overhead,
                    "transition applied"
                );
                Ok(TxOutcome::Confirmed { tx_id })
            }
            Err(reason) => {
                debug!(
                    transition = tx.transition.name(),
                    address = %tx.transition.address().short_id(),
                    %reason,
                    "transition rejected"
                );
                Ok(TxOutcome::Rejected(reason))
            }
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, TransportError> {
        self.inner
            .read()
            .map_err(|_| TransportError::Connection("ledger read lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, TransportError> {
        self.inner
            .write()
            .map_err(|_| TransportError::Connection("ledger write lock poisoned".into()))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default(), AddressDeriver::default())
    }
}

#[async_trait]
impl LedgerTransport for InMemoryLedger {
    async fn submit(&self, tx: &SignedTransition) -> Result<TxOutcome, TransportError> {
        self.apply(tx)
    }

    async fn fetch(&self, address: &AddressRef) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self
            .read()?
            .state
            .accounts
            .get(address)
            .map(|account| account.record.encode().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use escrow_crypto::{Keypair, TransitionSigner};

    use crate::error::RejectReason;
    use crate::transition::Transition;

    fn create_tx(ledger: &InMemoryLedger, initializer: &Keypair, taker: &Identity, nonce: u64) -> SignedTransition {
        let (address, bump) = ledger
            .machine()
            .deriver()
            .derive_identity(&initializer.identity())
            .unwrap();
        SignedTransition::sign(
            Transition::Create {
                initializer: initializer.identity(),
                taker: *taker,
                amount: 1_000_000,
                address,
                bump,
            },
            nonce,
            initializer,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_returns_encoded_record_until_closed() {
        let ledger = InMemoryLedger::default();
        let initializer = Keypair::generate();
        let taker = Keypair::generate();
        ledger.airdrop(&initializer.identity(), 2_000_000_000).unwrap();

        let create = create_tx(&ledger, &initializer, &taker.identity(), 1);
        let address = *create.transition.address();
        assert!(ledger.submit(&create).await.unwrap().is_confirmed());

        let bytes = ledger.fetch(&address).await.unwrap().unwrap();
        let record = EscrowRecord::decode(&bytes).unwrap();
        assert_eq!(record.taker(), taker.identity());

        let claim = SignedTransition::sign(
            Transition::Claim { address, caller: taker.identity() },
            2,
            &taker,
        )
        .unwrap();
        assert!(ledger.submit(&claim).await.unwrap().is_confirmed());
        assert_eq!(ledger.fetch(&address).await.unwrap(), None);
        assert_eq!(ledger.active_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn journal_records_which_terminal_transition_ran() {
        let ledger = InMemoryLedger::default();
        let initializer = Keypair::generate();
        ledger.airdrop(&initializer.identity(), 2_000_000_000).unwrap();

        let create = create_tx(&ledger, &initializer, &Identity::ephemeral(), 1);
        let address = *create.transition.address();
        ledger.submit(&create).await.unwrap();
        let cancel = SignedTransition::sign(
            Transition::Cancel { address, caller: initializer.identity() },
            2,
            &initializer,
        )
        .unwrap();
        ledger.submit(&cancel).await.unwrap();

        let journal = ledger.history(&address).unwrap();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[0].kind, SettlementKind::Created);
        assert_eq!(journal[1].kind, SettlementKind::Cancelled);
        assert_eq!(journal[1].tx_id, cancel.tx_id());
        assert_eq!(ledger.balance(&initializer.identity()).unwrap(), 2_000_000_000);

        assert_eq!(
            ledger.settlement_of(&address).unwrap(),
            Some(SettlementKind::Cancelled)
        );
    }

    #[tokio::test]
    async fn active_escrow_has_custody_and_no_settlement() {
        let ledger = InMemoryLedger::default();
        let initializer = Keypair::generate();
        ledger.airdrop(&initializer.identity(), 2_000_000_000).unwrap();

        let create = create_tx(&ledger, &initializer, &Identity::ephemeral(), 1);
        let address = *create.transition.address();
        ledger.submit(&create).await.unwrap();

        let custody = ledger.custody(&address).unwrap().unwrap();
        assert!(custody > 1_000_000);
        assert_eq!(
            ledger.balance(&initializer.identity()).unwrap(),
            2_000_000_000 - custody
        );
        assert_eq!(ledger.history(&address).unwrap().len(), 1);
        assert_eq!(ledger.settlement_of(&address).unwrap(), None);
    }

    #[test]
    fn airdrop_past_u64_max_is_refused() {
        let ledger = InMemoryLedger::default();
        let who = Identity::ephemeral();
        ledger.airdrop(&who, u64::MAX - 5).unwrap();

        let err = ledger.airdrop(&who, 6).unwrap_err();
        assert!(matches!(err, LedgerError::BalanceOverflow(_)));
        assert_eq!(ledger.balance(&who).unwrap(), u64::MAX - 5);
        assert_eq!(ledger.airdrop(&who, 5).unwrap(), u64::MAX);
    }

    #[tokio::test]
    async fn rejected_submission_leaves_no_trace() {
        let ledger = InMemoryLedger::default();
        let initializer = Keypair::generate();

        let create = create_tx(&ledger, &initializer, &Identity::ephemeral(), 1);
        let outcome = ledger.submit(&create).await.unwrap();
        assert_eq!(outcome, TxOutcome::Rejected(RejectReason::InsufficientFunds));
        assert!(ledger.history(create.transition.address()).unwrap().is_empty());
        assert_eq!(ledger.custody(create.transition.address()).unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_claim_and_cancel_settle_exactly_once() {
        let ledger = Arc::new(InMemoryLedger::default());
        let initializer = Arc::new(Keypair::generate());
        let taker = Arc::new(Keypair::generate());
        ledger.airdrop(&initializer.identity(), 2_000_000_000).unwrap();

        let create = create_tx(&ledger, &initializer, &taker.identity(), 1);
        let address = *create.transition.address();
        ledger.submit(&create).await.unwrap();

        let claim = SignedTransition::sign(
            Transition::Claim { address, caller: taker.identity() },
            2,
            taker.as_ref(),
        )
        .unwrap();
        let cancel = SignedTransition::sign(
            Transition::Cancel { address, caller: initializer.identity() },
            3,
            initializer.as_ref(),
        )
        .unwrap();

        let l1 = Arc::clone(&ledger);
        let l2 = Arc::clone(&ledger);
        let (a, b) = tokio::join!(
            tokio::spawn(async move { l1.submit(&claim).await }),
            tokio::spawn(async move { l2.submit(&cancel).await }),
        );
        let outcomes = [a.unwrap().unwrap(), b.unwrap().unwrap()];

        assert_eq!(outcomes.iter().filter(|o| o.is_confirmed()).count(), 1);
        assert!(outcomes.contains(&TxOutcome::Rejected(RejectReason::NotFound)));
        assert_eq!(ledger.history(&address).unwrap().len(), 2);
    }
}
