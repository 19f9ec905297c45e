use tracing::{debug, info, warn};

use escrow_client::{ClientConfig, LedgerClient};
use escrow_crypto::TransitionSigner;
use escrow_ledger::{LedgerTransport, SignedTransition, Transition};
use escrow_types::{AddressRef, EscrowRecord, Identity};

use crate::directory::EscrowDirectory;
use crate::error::{EscrowError, EscrowResult};

/// Client-side orchestration of the escrow lifecycle.
///
/// Holds no mutable state. Every operation is one independent exchange
/// with the ledger, so a coordinator can be shared freely across tasks.
/// Nothing is retried: an [`EscrowError::Unconfirmed`] result means the
/// caller must look the escrow up again to learn what happened.
pub struct EscrowCoordinator<T> {
    client: LedgerClient<T>,
    directory: EscrowDirectory,
}

impl<T: LedgerTransport> EscrowCoordinator<T> {
    pub fn new(client: LedgerClient<T>, directory: EscrowDirectory) -> Self {
        Self { client, directory }
    }

    /// Build a coordinator from client settings.
    pub fn with_config(transport: T, config: &ClientConfig) -> EscrowResult<Self> {
        let deriver = config.deriver()?;
        Ok(Self::new(
            LedgerClient::with_config(transport, config),
            EscrowDirectory::new(deriver),
        ))
    }

    pub fn client(&self) -> &LedgerClient<T> {
        &self.client
    }

    pub fn directory(&self) -> &EscrowDirectory {
        &self.directory
    }

    /// Open an escrow of `amount` for `taker`, funded by `initializer`.
    ///
    /// `taker` is the taker's identity as 64 hex chars, optionally prefixed
    /// with `id:`. Input is validated before anything is sent.
    pub async fn initialize(
        &self,
        initializer: &dyn TransitionSigner,
        taker: &str,
        amount: u64,
    ) -> EscrowResult<AddressRef> {
        let taker: Identity = taker
            .trim()
            .parse()
            .map_err(|e| EscrowError::InvalidInput(format!("taker: {e}")))?;
        if amount == 0 {
            return Err(EscrowError::InvalidInput("amount must be at least 1".into()));
        }
        let owner = initializer.identity();
        let slot = self
            .directory
            .slot(&owner)
            .map_err(|e| EscrowError::InvalidInput(format!("initializer: {e}")))?;

        let transition = Transition::Create {
            initializer: owner,
            taker,
            amount,
            address: slot.address,
            bump: slot.bump,
        };
        self.submit(transition, initializer).await?;

        info!(
            address = %slot.address.short_id(),
            initializer = %owner.short_id(),
            taker = %taker.short_id(),
            amount,
            "escrow initialized"
        );
        Ok(slot.address)
    }

    /// Read the active escrow at `address`.
    ///
    /// [`EscrowError::NotFound`] is the normal answer for settled, cancelled
    /// and never-created escrows.
    pub async fn lookup(&self, address: &AddressRef) -> EscrowResult<EscrowRecord> {
        self.find(address).await?.ok_or(EscrowError::NotFound)
    }

    /// Like [`lookup`](Self::lookup), with absence as `Ok(None)`.
    pub async fn find(&self, address: &AddressRef) -> EscrowResult<Option<EscrowRecord>> {
        let record = self.client.fetch_record(address).await?;
        debug!(address = %address.short_id(), found = record.is_some(), "lookup");
        Ok(record)
    }

    /// Read the active escrow opened by `initializer`.
    pub async fn lookup_by_initializer(&self, initializer: &Identity) -> EscrowResult<EscrowRecord> {
        let address = self
            .directory
            .address_of(initializer)
            .map_err(|e| EscrowError::InvalidInput(format!("initializer: {e}")))?;
        self.lookup(&address).await
    }

    /// Release the escrow at `address` to its taker. Only the taker may call.
    pub async fn claim(&self, address: &AddressRef, caller: &dyn TransitionSigner) -> EscrowResult<()> {
        let transition = Transition::Claim {
            address: *address,
            caller: caller.identity(),
        };
        self.submit(transition, caller).await?;
        info!(address = %address.short_id(), taker = %caller.identity().short_id(), "escrow claimed");
        Ok(())
    }

    /// Return the escrow at `address` to its initializer. Only the initializer may call.
    pub async fn cancel(&self, address: &AddressRef, caller: &dyn TransitionSigner) -> EscrowResult<()> {
        let transition = Transition::Cancel {
            address: *address,
            caller: caller.identity(),
        };
        self.submit(transition, caller).await?;
        info!(
            address = %address.short_id(),
            initializer = %caller.identity().short_id(),
            "escrow cancelled"
        );
        Ok(())
    }

    async fn submit(&self, transition: Transition, signer: &dyn TransitionSigner) -> EscrowResult<()> {
        let name = transition.name();
        let address = *transition.address();
        let tx = SignedTransition::sign(transition, rand::random(), signer)
            .map_err(|e| EscrowError::TransportFailure(format!("encoding: {e}")))?;

        match self.client.submit(&tx).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = EscrowError::from(e);
                if err.is_definitive() {
                    debug!(transition = name, address = %address.short_id(), error = %err, "transition failed");
                } else {
                    warn!(transition = name, address = %address.short_id(), "transition unconfirmed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use escrow_crypto::Keypair;
    use escrow_ledger::{InMemoryLedger, SettlementKind};

    fn setup() -> (Arc<InMemoryLedger>, EscrowCoordinator<Arc<InMemoryLedger>>) {
        let ledger = Arc::new(InMemoryLedger::default());
        let coordinator = EscrowCoordinator::new(
            LedgerClient::new(Arc::clone(&ledger), Duration::from_secs(5)),
            EscrowDirectory::default(),
        );
        (ledger, coordinator)
    }

    #[tokio::test]
    async fn initialize_returns_the_directory_slot() {
        let (ledger, coordinator) = setup();
        let initializer = Keypair::generate();
        ledger.airdrop(&initializer.identity(), 10_000_000).unwrap();
        let taker = Identity::ephemeral();

        let address = coordinator
            .initialize(&initializer, &taker.to_string(), 42)
            .await
            .unwrap();
        assert_eq!(
            address,
            coordinator.directory().address_of(&initializer.identity()).unwrap()
        );
    }

    #[tokio::test]
    async fn taker_accepts_prefixed_form() {
        let (ledger, coordinator) = setup();
        let initializer = Keypair::generate();
        ledger.airdrop(&initializer.identity(), 10_000_000).unwrap();
        let taker = Identity::ephemeral();

        let address = coordinator
            .initialize(&initializer, &format!("id:{}", taker.to_hex()), 5)
            .await
            .unwrap();
        assert_eq!(coordinator.lookup(&address).await.unwrap().taker(), taker);
    }

    #[tokio::test]
    async fn malformed_taker_is_invalid_input() {
        let (ledger, coordinator) = setup();
        let initializer = Keypair::generate();
        ledger.airdrop(&initializer.identity(), 10_000_000).unwrap();

        let inputs = vec![
            String::new(),
            "zz".to_string(),
            "abcd".to_string(),
            "0".repeat(63),
            "g".repeat(64),
            format!("esc:{}", "1".repeat(64)),
        ];
        for taker in &inputs {
            let err = coordinator.initialize(&initializer, taker, 5).await.unwrap_err();
            assert!(matches!(err, EscrowError::InvalidInput(_)), "{taker:?} -> {err:?}");
        }
        assert_eq!(ledger.active_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn second_escrow_for_same_initializer_already_exists() {
        let (ledger, coordinator) = setup();
        let initializer = Keypair::generate();
        ledger.airdrop(&initializer.identity(), 10_000_000).unwrap();
        let taker = Identity::ephemeral().to_string();

        coordinator.initialize(&initializer, &taker, 1).await.unwrap();
        let err = coordinator.initialize(&initializer, &taker, 1).await.unwrap_err();
        assert_eq!(err, EscrowError::AlreadyExists);
    }

    #[tokio::test]
    async fn underfunded_initializer_is_rejected() {
        let (ledger, coordinator) = setup();
        let initializer = Keypair::generate();
        let overhead = ledger.machine().config().record_overhead();
        ledger.airdrop(&initializer.identity(), overhead).unwrap();

        let err = coordinator
            .initialize(&initializer, &Identity::ephemeral().to_string(), 1)
            .await
            .unwrap_err();
        assert_eq!(err, EscrowError::InsufficientFunds);
        assert_eq!(ledger.balance(&initializer.identity()).unwrap(), overhead);
    }

    #[tokio::test]
    async fn claim_pays_taker_amount_and_overhead() {
        let (ledger, coordinator) = setup();
        let initializer = Keypair::generate();
        let taker = Keypair::generate();
        ledger.airdrop(&initializer.identity(), 10_000_000).unwrap();
        let overhead = ledger.machine().config().record_overhead();

        let address = coordinator
            .initialize(&initializer, &taker.identity().to_string(), 1_000)
            .await
            .unwrap();
        coordinator.claim(&address, &taker).await.unwrap();

        assert_eq!(ledger.balance(&taker.identity()).unwrap(), 1_000 + overhead);
        assert_eq!(
            ledger.balance(&initializer.identity()).unwrap(),
            10_000_000 - 1_000 - overhead
        );
        let journal = ledger.history(&address).unwrap();
        assert_eq!(journal.last().map(|e| e.kind), Some(SettlementKind::Claimed));
    }

    #[tokio::test]
    async fn find_reports_absence_as_none() {
        let (_, coordinator) = setup();
        let address = AddressRef::from_bytes([8; 32]);
        assert_eq!(coordinator.find(&address).await.unwrap(), None);
        assert_eq!(coordinator.lookup(&address).await.unwrap_err(), EscrowError::NotFound);
    }

    #[test]
    fn with_config_uses_configured_label() {
        let config = ClientConfig {
            domain_label: "vault".into(),
            ..ClientConfig::default()
        };
        let coordinator =
            EscrowCoordinator::with_config(Arc::new(InMemoryLedger::default()), &config).unwrap();
        assert_eq!(coordinator.directory().deriver().label(), b"vault");
        assert_eq!(coordinator.client().confirm_timeout(), config.confirm_timeout());
    }
}
