/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so identical bytes hashed under different domains never
/// collide.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for transaction identifiers (hash of a transition signature).
    pub const TRANSACTION: Self = Self {
        domain: "escrow-tx-v1",
    };
    /// Hasher for replay-protection keys.
    pub const NONCE: Self = Self {
        domain: "escrow-nonce-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }
}
