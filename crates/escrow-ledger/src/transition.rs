use serde::{Deserialize, Serialize};

use escrow_crypto::{ContentHasher, Signature, SignatureError, TransitionSigner};
use escrow_types::{AddressRef, Bump, Identity, Role};

use crate::error::LedgerError;
use crate::outcome::TxId;

const TRANSITION_DOMAIN: &[u8] = b"escrow-transition-v1:";

/// A state-changing request against one escrow record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// `NonExistent -> Active`. Funds the record from the initializer.
    Create {
        initializer: Identity,
        taker: Identity,
        amount: u64,
        address: AddressRef,
        bump: Bump,
    },
    /// `Active -> NonExistent`. Releases funds to the taker.
    Claim { address: AddressRef, caller: Identity },
    /// `Active -> NonExistent`. Returns funds to the initializer.
    Cancel { address: AddressRef, caller: Identity },
}

impl Transition {
    /// The record this transition targets.
    pub fn address(&self) -> &AddressRef {
        match self {
            Self::Create { address, .. }
            | Self::Claim { address, .. }
            | Self::Cancel { address, .. } => address,
        }
    }

    /// The identity that must authorize (sign) this transition.
    pub fn actor(&self) -> &Identity {
        match self {
            Self::Create { initializer, .. } => initializer,
            Self::Claim { caller, .. } | Self::Cancel { caller, .. } => caller,
        }
    }

    /// Role the actor must hold on the record.
    pub fn required_role(&self) -> Role {
        match self {
            Self::Create { .. } | Self::Cancel { .. } => Role::Initializer,
            Self::Claim { .. } => Role::Taker,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Claim { .. } => "claim",
            Self::Cancel { .. } => "cancel",
        }
    }
}

/// A transition bound to its signer.
///
/// The signature covers the transition and a nonce under a fixed domain
/// prefix. The nonce makes two otherwise identical requests distinct and
/// lets the ledger refuse replays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransition {
    pub transition: Transition,
    pub nonce: u64,
    pub signer: Identity,
    pub signature: Signature,
}

impl SignedTransition {
    /// Encode and sign `transition` with `signer`.
    pub fn sign(
        transition: Transition,
        nonce: u64,
        signer: &dyn TransitionSigner,
    ) -> Result<Self, LedgerError> {
        let message = signing_message(&transition, nonce)?;
        Ok(Self {
            signature: signer.sign(&message),
            signer: signer.identity(),
            transition,
            nonce,
        })
    }

    /// The exact bytes the signature covers.
    pub fn message(&self) -> Result<Vec<u8>, LedgerError> {
        signing_message(&self.transition, self.nonce)
    }

    /// Check the signature against the embedded signer identity.
    pub fn verify(&self) -> Result<(), SignatureError> {
        let message = self
            .message()
            .map_err(|_| SignatureError::InvalidSignature)?;
        escrow_crypto::verify(&self.signer, &message, &self.signature)
    }

    /// Identifier assigned to this transition once accepted.
    pub fn tx_id(&self) -> TxId {
        TxId(ContentHasher::TRANSACTION.hash(&self.signature.to_bytes()))
    }

    /// Key the ledger uses to detect resubmission.
    pub fn replay_key(&self) -> [u8; 32] {
        let mut data = Vec::with_capacity(40);
        data.extend_from_slice(self.signer.as_bytes());
        data.extend_from_slice(&self.nonce.to_le_bytes());
        ContentHasher::NONCE.hash(&data)
    }
}

fn signing_message(transition: &Transition, nonce: u64) -> Result<Vec<u8>, LedgerError> {
    let body = bincode::serialize(&(transition, nonce))
        .map_err(|e| LedgerError::Serialization(e.to_string()))?;
    let mut message = Vec::with_capacity(TRANSITION_DOMAIN.len() + body.len());
    message.extend_from_slice(TRANSITION_DOMAIN);
    message.extend_from_slice(&body);
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrow_crypto::Keypair;

    fn claim(caller: Identity) -> Transition {
        Transition::Claim {
            address: AddressRef::from_bytes([1; 32]),
            caller,
        }
    }

    #[test]
    fn signed_transition_verifies() {
        let kp = Keypair::generate();
        let tx = SignedTransition::sign(claim(kp.identity()), 7, &kp).unwrap();
        assert_eq!(tx.signer, kp.identity());
        assert!(tx.verify().is_ok());
    }

    #[test]
    fn tampered_transition_fails_verification() {
        let kp = Keypair::generate();
        let mut tx = SignedTransition::sign(claim(kp.identity()), 7, &kp).unwrap();
        tx.transition = Transition::Cancel {
            address: AddressRef::from_bytes([1; 32]),
            caller: kp.identity(),
        };
        assert_eq!(tx.verify(), Err(SignatureError::InvalidSignature));
    }

    #[test]
    fn nonce_is_covered_by_signature() {
        let kp = Keypair::generate();
        let mut tx = SignedTransition::sign(claim(kp.identity()), 1, &kp).unwrap();
        tx.nonce = 2;
        assert!(tx.verify().is_err());
    }

    #[test]
    fn replay_key_depends_on_signer_and_nonce() {
        let kp = Keypair::generate();
        let a = SignedTransition::sign(claim(kp.identity()), 1, &kp).unwrap();
        let b = SignedTransition::sign(claim(kp.identity()), 2, &kp).unwrap();
        assert_ne!(a.replay_key(), b.replay_key());
        assert_eq!(a.replay_key(), a.clone().replay_key());
    }

    #[test]
    fn roles_and_actors() {
        let me = Identity::from_bytes([3; 32]);
        let create = Transition::Create {
            initializer: me,
            taker: Identity::from_bytes([4; 32]),
            amount: 1,
            address: AddressRef::from_bytes([5; 32]),
            bump: Bump(255),
        };
        assert_eq!(create.required_role(), Role::Initializer);
        assert_eq!(create.actor(), &me);
        assert_eq!(claim(me).required_role(), Role::Taker);
        assert_eq!(claim(me).name(), "claim");
    }
}
