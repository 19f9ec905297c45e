//! In-process settlement service reachable over framed bytes.
//!
//! [`LedgerService`] owns an [`InMemoryLedger`] and answers framed
//! [`EscrowMessage`] requests arriving on a tokio mpsc channel.
//! [`ChannelTransport`] is the client half: it implements
//! [`LedgerTransport`] by encoding requests, sending them down the channel
//! and decoding the framed reply.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use escrow_ledger::{InMemoryLedger, LedgerTransport, SignedTransition, TransportError, TxOutcome};
use escrow_types::AddressRef;

use crate::codec::EscrowCodec;
use crate::error::ProtocolError;
use crate::message::{error_codes, EscrowMessage};

/// A framed request paired with the slot its framed reply goes to.
struct Envelope {
    frame: Bytes,
    reply: oneshot::Sender<Bytes>,
}

/// Settlement service answering framed requests against an in-memory ledger.
pub struct LedgerService {
    ledger: Arc<InMemoryLedger>,
}

impl LedgerService {
    pub fn new(ledger: Arc<InMemoryLedger>) -> Self {
        Self { ledger }
    }

    /// Start the service loop on the current runtime.
    ///
    /// The loop ends once every [`ChannelTransport`] clone is dropped.
    pub fn spawn(ledger: Arc<InMemoryLedger>, buffer: usize) -> (ChannelTransport, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let service = Self::new(ledger);
        let handle = tokio::spawn(service.run(rx));
        (ChannelTransport::new(tx), handle)
    }

    async fn run(self, mut rx: mpsc::Receiver<Envelope>) {
        while let Some(envelope) = rx.recv().await {
            let response = self.handle_frame(&envelope.frame);
            let frame = match EscrowCodec::encode(&response) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "failed to encode response");
                    continue;
                }
            };
            if envelope.reply.send(frame).is_err() {
                debug!("requester went away before the reply");
            }
        }
        debug!("ledger service stopped");
    }

    /// Decode one framed request and produce the response message.
    pub fn handle_frame(&self, frame: &[u8]) -> EscrowMessage {
        match EscrowCodec::decode(frame) {
            Ok((msg, _)) => self.handle(msg),
            Err(e) => EscrowMessage::Error {
                request_id: 0,
                code: error_codes::BAD_REQUEST,
                message: e.to_string(),
            },
        }
    }

    fn handle(&self, msg: EscrowMessage) -> EscrowMessage {
        let request_id = msg.request_id();
        match msg {
            EscrowMessage::SubmitRequest { tx, .. } => match self.ledger.apply(&tx) {
                Ok(outcome) => EscrowMessage::SubmitResponse { request_id, outcome },
                Err(e) => unavailable(request_id, e),
            },
            EscrowMessage::FetchRequest { address, .. } => match self.ledger.record(&address) {
                Ok(record) => EscrowMessage::FetchResponse {
                    request_id,
                    data: record.map(|r| r.encode().to_vec()),
                },
                Err(e) => unavailable(request_id, e),
            },
            other => EscrowMessage::Error {
                request_id,
                code: error_codes::UNSUPPORTED,
                message: format!("{} is not a request", other.type_name()),
            },
        }
    }
}

fn unavailable(request_id: u64, err: TransportError) -> EscrowMessage {
    EscrowMessage::Error {
        request_id,
        code: error_codes::UNAVAILABLE,
        message: err.to_string(),
    }
}

/// [`LedgerTransport`] over a [`LedgerService`] channel.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Envelope>,
    next_id: Arc<AtomicU64>,
}

impl ChannelTransport {
    fn new(tx: mpsc::Sender<Envelope>) -> Self {
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn round_trip(&self, request: EscrowMessage) -> Result<EscrowMessage, TransportError> {
        let request_id = request.request_id();
        let frame = EscrowCodec::encode(&request).map_err(protocol_error)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope { frame, reply: reply_tx })
            .await
            .map_err(|_| TransportError::Connection("ledger service is not running".into()))?;
        let reply = reply_rx
            .await
            .map_err(|_| TransportError::Connection("ledger service dropped the request".into()))?;
        let (response, _) = EscrowCodec::decode(&reply).map_err(protocol_error)?;

        match response {
            EscrowMessage::Error { code, message, .. } if code == error_codes::UNAVAILABLE => {
                Err(TransportError::Connection(message))
            }
            EscrowMessage::Error { code, message, .. } => {
                Err(protocol_error(ProtocolError::RemoteError { code, message }))
            }
            response if response.request_id() != request_id => Err(TransportError::Protocol(format!(
                "response id {} does not match request id {}",
                response.request_id(),
                request_id
            ))),
            response => Ok(response),
        }
    }
}

fn protocol_error(err: ProtocolError) -> TransportError {
    TransportError::Protocol(err.to_string())
}

#[async_trait]
impl LedgerTransport for ChannelTransport {
    async fn submit(&self, tx: &SignedTransition) -> Result<TxOutcome, TransportError> {
        let request = EscrowMessage::SubmitRequest {
            request_id: self.next_request_id(),
            tx: tx.clone(),
        };
        match self.round_trip(request).await? {
            EscrowMessage::SubmitResponse { outcome, .. } => Ok(outcome),
            other => Err(protocol_error(ProtocolError::UnexpectedResponse {
                expected: "SubmitResponse",
                actual: other.type_name(),
            })),
        }
    }

    async fn fetch(&self, address: &AddressRef) -> Result<Option<Vec<u8>>, TransportError> {
        let request = EscrowMessage::FetchRequest {
            request_id: self.next_request_id(),
            address: *address,
        };
        match self.round_trip(request).await? {
            EscrowMessage::FetchResponse { data, .. } => Ok(data),
            other => Err(protocol_error(ProtocolError::UnexpectedResponse {
                expected: "FetchResponse",
                actual: other.type_name(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrow_crypto::{Keypair, TransitionSigner};
    use escrow_ledger::{RejectReason, Transition};
    use escrow_types::{EscrowRecord, Identity};

    fn create(ledger: &InMemoryLedger, initializer: &Keypair, taker: Identity) -> SignedTransition {
        let (address, bump) = ledger
            .machine()
            .deriver()
            .derive_identity(&initializer.identity())
            .unwrap();
        SignedTransition::sign(
            Transition::Create {
                initializer: initializer.identity(),
                taker,
                amount: 1_000_000,
                address,
                bump,
            },
            1,
            initializer,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn submit_and_fetch_through_the_channel() {
        let ledger = Arc::new(InMemoryLedger::default());
        let initializer = Keypair::generate();
        let taker = Identity::ephemeral();
        ledger.airdrop(&initializer.identity(), 2_000_000_000).unwrap();
        let (transport, _handle) = LedgerService::spawn(Arc::clone(&ledger), 8);

        let tx = create(&ledger, &initializer, taker);
        let address = *tx.transition.address();
        assert!(transport.submit(&tx).await.unwrap().is_confirmed());

        let bytes = transport.fetch(&address).await.unwrap().unwrap();
        let record = EscrowRecord::decode(&bytes).unwrap();
        assert_eq!(record.initializer(), initializer.identity());
        assert_eq!(record.taker(), taker);
        assert_eq!(record.amount(), 1_000_000);

        let again = transport.submit(&tx).await.unwrap();
        assert_eq!(again, TxOutcome::Rejected(RejectReason::Duplicate));
    }

    #[tokio::test]
    async fn fetch_of_unknown_address_is_none() {
        let (transport, _handle) = LedgerService::spawn(Arc::new(InMemoryLedger::default()), 1);
        let missing = AddressRef::from_bytes([9; 32]);
        assert_eq!(transport.fetch(&missing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn stopped_service_is_a_connection_failure() {
        let (transport, handle) = LedgerService::spawn(Arc::new(InMemoryLedger::default()), 1);
        handle.abort();
        let _ = handle.await;

        let err = transport
            .fetch(&AddressRef::from_bytes([1; 32]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
    }

    #[test]
    fn garbage_frame_gets_bad_request() {
        let service = LedgerService::new(Arc::new(InMemoryLedger::default()));
        match service.handle_frame(&[0, 0, 0, 2, 1, 0xFF]) {
            EscrowMessage::Error { code, .. } => assert_eq!(code, error_codes::BAD_REQUEST),
            other => panic!("unexpected {}", other.type_name()),
        }
    }

    #[test]
    fn response_sent_as_request_is_unsupported() {
        let service = LedgerService::new(Arc::new(InMemoryLedger::default()));
        let frame = EscrowCodec::encode(&EscrowMessage::FetchResponse {
            request_id: 5,
            data: None,
        })
        .unwrap();
        match service.handle_frame(&frame) {
            EscrowMessage::Error { request_id, code, .. } => {
                assert_eq!(request_id, 5);
                assert_eq!(code, error_codes::UNSUPPORTED);
            }
            other => panic!("unexpected {}", other.type_name()),
        }
    }
}
