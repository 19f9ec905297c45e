use std::time::Duration;

use tracing::{debug, warn};

use escrow_ledger::{LedgerTransport, SignedTransition, TransportError, TxId, TxOutcome};
use escrow_types::{AddressRef, EscrowRecord};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Typed access to the settlement layer.
///
/// Never retries. A submission that does not produce a definitive outcome
/// within `confirm_timeout` is reported as [`ClientError::Unconfirmed`] and
/// left for the caller to reconcile by reading state.
pub struct LedgerClient<T> {
    transport: T,
    confirm_timeout: Duration,
}

impl<T: LedgerTransport> LedgerClient<T> {
    pub fn new(transport: T, confirm_timeout: Duration) -> Self {
        Self {
            transport,
            confirm_timeout,
        }
    }

    pub fn with_config(transport: T, config: &ClientConfig) -> Self {
        Self::new(transport, config.confirm_timeout())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn confirm_timeout(&self) -> Duration {
        self.confirm_timeout
    }

    /// Submit a signed transition and wait for its outcome.
    pub async fn submit(&self, tx: &SignedTransition) -> ClientResult<TxId> {
        let address = tx.transition.address();
        debug!(
            transition = tx.transition.name(),
            address = %address.short_id(),
            nonce = tx.nonce,
            "submitting transition"
        );

        let outcome = match tokio::time::timeout(self.confirm_timeout, self.transport.submit(tx)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    transition = tx.transition.name(),
                    address = %address.short_id(),
                    timeout_ms = self.confirm_timeout.as_millis() as u64,
                    "no confirmation before timeout"
                );
                return Err(ClientError::Unconfirmed);
            }
        };

        match outcome {
            Ok(TxOutcome::Confirmed { tx_id }) => {
                debug!(%tx_id, "transition confirmed");
                Ok(tx_id)
            }
            Ok(TxOutcome::Rejected(reason)) => {
                warn!(
                    transition = tx.transition.name(),
                    address = %address.short_id(),
                    %reason,
                    "transition rejected"
                );
                Err(ClientError::Rejected(reason))
            }
            Err(TransportError::Timeout) => {
                warn!(address = %address.short_id(), "transport timed out");
                Err(ClientError::Unconfirmed)
            }
            Err(e) => Err(ClientError::Transport(e.to_string())),
        }
    }

    /// Raw bytes stored at `address`.
    pub async fn fetch_raw(&self, address: &AddressRef) -> ClientResult<Option<Vec<u8>>> {
        debug!(address = %address.short_id(), "fetching record");
        match tokio::time::timeout(self.confirm_timeout, self.transport.fetch(address)).await {
            Ok(result) => result.map_err(|e| ClientError::Transport(e.to_string())),
            Err(_) => Err(ClientError::Transport(format!(
                "fetch timed out after {} ms",
                self.confirm_timeout.as_millis()
            ))),
        }
    }

    /// Fetch and decode the escrow record at `address`.
    pub async fn fetch_record(&self, address: &AddressRef) -> ClientResult<Option<EscrowRecord>> {
        match self.fetch_raw(address).await? {
            Some(bytes) => EscrowRecord::decode(&bytes)
                .map(Some)
                .map_err(|e| ClientError::MalformedRecord(e.to_string())),
            None => Ok(None),
        }
    }
}
