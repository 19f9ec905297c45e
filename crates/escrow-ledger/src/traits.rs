use std::sync::Arc;

use async_trait::async_trait;

use escrow_types::AddressRef;

use crate::error::TransportError;
use crate::outcome::TxOutcome;
use crate::transition::SignedTransition;

/// Request/response channel to the authoritative settlement layer.
///
/// This is the whole contract the client depends on. Implementations must
/// apply each submitted transition atomically and serialize transitions
/// against the same address; the client never compensates for either.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Submit a signed transition and wait for its definitive outcome.
    async fn submit(&self, tx: &SignedTransition) -> Result<TxOutcome, TransportError>;

    /// Fetch the raw bytes stored at `address`, or `None` if no record exists.
    async fn fetch(&self, address: &AddressRef) -> Result<Option<Vec<u8>>, TransportError>;
}

#[async_trait]
impl<T: LedgerTransport + ?Sized> LedgerTransport for Arc<T> {
    async fn submit(&self, tx: &SignedTransition) -> Result<TxOutcome, TransportError> {
        (**self).submit(tx).await
    }

    async fn fetch(&self, address: &AddressRef) -> Result<Option<Vec<u8>>, TransportError> {
        (**self).fetch(address).await
    }
}
