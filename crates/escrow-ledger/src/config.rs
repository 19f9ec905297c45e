use serde::{Deserialize, Serialize};

use escrow_types::RECORD_LEN;

/// Bytes every stored account is charged for on top of its data.
pub const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;

/// Account discriminator prepended to the record by the settlement program.
pub const DISCRIMINATOR_LEN: u64 = 8;

/// Settlement-layer economics needed to keep the account lifecycle correct.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Storage price per byte per year, in the smallest asset unit.
    pub lamports_per_byte_year: u64,
    /// Years of storage a record must prepay to be exempt from collection.
    pub exemption_threshold_years: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lamports_per_byte_year: 3480,
            exemption_threshold_years: 2,
        }
    }
}

impl LedgerConfig {
    /// Account space of one escrow record.
    pub fn record_space() -> u64 {
        DISCRIMINATOR_LEN + RECORD_LEN as u64
    }

    /// Storage overhead locked in a record's account while it exists.
    pub fn record_overhead(&self) -> u64 {
        self.minimum_balance(Self::record_space())
    }

    /// Minimum balance for an account holding `space` bytes of data.
    pub fn minimum_balance(&self, space: u64) -> u64 {
        (ACCOUNT_STORAGE_OVERHEAD + space)
            .saturating_mul(self.lamports_per_byte_year)
            .saturating_mul(self.exemption_threshold_years)
    }
}
