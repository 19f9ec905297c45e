use crate::error::TypeError;
use crate::identity::Identity;

/// Encoded size of an [`EscrowRecord`]: `initializer | taker | amount`.
pub const RECORD_LEN: usize = 32 + 32 + 8;

/// The sole persistent escrow entity.
///
/// A record exists only while the escrow is active. Claiming or cancelling
/// removes it, so there is no status field: absence is the terminal state.
/// Fields are only reachable through [`EscrowRecord::new`] and
/// [`EscrowRecord::decode`], so every value has `amount >= 1`.
///
/// ```compile_fail
/// use escrow_types::{EscrowRecord, Identity};
/// let id = Identity::from_bytes([1; 32]);
/// let _ = EscrowRecord { initializer: id, taker: id, amount: 0 };
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EscrowRecord {
    initializer: Identity,
    taker: Identity,
    amount: u64,
}

impl EscrowRecord {
    pub fn new(initializer: Identity, taker: Identity, amount: u64) -> Result<Self, TypeError> {
        if amount == 0 {
            return Err(TypeError::ZeroAmount);
        }
        Ok(Self {
            initializer,
            taker,
            amount,
        })
    }

    /// Depositing party. May cancel.
    pub fn initializer(&self) -> Identity {
        self.initializer
    }

    /// Sole party entitled to claim.
    pub fn taker(&self) -> Identity {
        self.taker
    }

    /// Held quantity in the smallest indivisible unit. Always at least 1.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Encode to the fixed binary layout (amount is little-endian).
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[..32].copy_from_slice(self.initializer.as_bytes());
        buf[32..64].copy_from_slice(self.taker.as_bytes());
        buf[64..].copy_from_slice(&self.amount.to_le_bytes());
        buf
    }

    /// Decode from the fixed binary layout.
    ///
    /// Buffers shorter than [`RECORD_LEN`] are rejected; trailing bytes past
    /// the layout are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, TypeError> {
        if data.len() < RECORD_LEN {
            return Err(TypeError::Undersized {
                expected: RECORD_LEN,
                actual: data.len(),
            });
        }
        let initializer = Identity::from_slice(&data[..32])?;
        let taker = Identity::from_slice(&data[32..64])?;
        let mut amount = [0u8; 8];
        amount.copy_from_slice(&data[64..RECORD_LEN]);
        Self::new(initializer, taker, u64::from_le_bytes(amount))
    }
}
