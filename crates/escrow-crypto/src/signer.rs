use escrow_types::Identity;
use serde::{Deserialize, Serialize};

/// Ed25519 key pair held by a wallet.
pub struct Keypair(ed25519_dalek::SigningKey);

/// Ed25519 signature.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "signature_serde")] ed25519_dalek::Signature);

/// Signing capability over outgoing transitions.
///
/// Wallets implement this; the coordinator only ever sees the public
/// identity and the produced signature, never key material.
pub trait TransitionSigner: Send + Sync {
    /// Public identity the signatures verify against.
    fn identity(&self) -> Identity;

    /// Sign an encoded transition message.
    fn sign(&self, message: &[u8]) -> Signature;
}

impl Keypair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Create from a raw 32-byte secret.
    pub fn from_secret(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// Raw secret key bytes.
    pub fn secret_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl TransitionSigner for Keypair {
    fn identity(&self) -> Identity {
        Identity::from_bytes(self.0.verifying_key().to_bytes())
    }

    fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message))
    }
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(ed25519_dalek::Signature::from_bytes(&bytes))
    }
}

/// Verify `signature` over `message` against a party identity.
pub fn verify(identity: &Identity, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
    use ed25519_dalek::Verifier;
    let key = ed25519_dalek::VerifyingKey::from_bytes(identity.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    key.verify(message, &signature.0)
        .map_err(|_| SignatureError::InvalidSignature)
}

/// Whether `bytes` decompress to a point on the ed25519 curve.
///
/// Off-curve values cannot be public keys, so nobody holds a secret for them.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    ed25519_dalek::VerifyingKey::from_bytes(bytes).is_ok()
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Keypair({}, <redacted>)", self.identity().short_id())
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Signature({}...)",
            hex::encode(&self.0.to_bytes()[..8])
        )
    }
}

/// Errors from signing operations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid key")]
    InvalidKey,
}

mod signature_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(sig: &ed25519_dalek::Signature, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&sig.to_bytes())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ed25519_dalek::Signature, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 64-byte signature"))?;
        Ok(ed25519_dalek::Signature::from_bytes(&arr))
    }
}
