use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use escrow_crypto::{AddressDeriver, DEFAULT_LABEL, ESCROW_PROGRAM_ID};

use crate::error::{ClientError, ClientResult};

/// Client settings, loadable from TOML.
///
/// ```toml
/// confirm_timeout_ms = 5000
/// program_id = "2b1e...c4"
/// domain_label = "escrow"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// How long a submission may wait for a definitive outcome.
    pub confirm_timeout_ms: u64,
    /// Hex-encoded 32-byte escrow program id.
    pub program_id: String,
    /// Domain label mixed into every address derivation.
    pub domain_label: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_ms: 30_000,
            program_id: hex::encode(ESCROW_PROGRAM_ID),
            domain_label: String::from_utf8_lossy(DEFAULT_LABEL).into_owned(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(s: &str) -> ClientResult<Self> {
        toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn program_id_bytes(&self) -> ClientResult<[u8; 32]> {
        let bytes = hex::decode(&self.program_id)
            .map_err(|e| ClientError::Config(format!("program_id: {e}")))?;
        bytes.try_into().map_err(|b: Vec<u8>| {
            ClientError::Config(format!("program_id: expected 32 bytes, got {}", b.len()))
        })
    }

    /// Address deriver for the configured program and label.
    pub fn deriver(&self) -> ClientResult<AddressDeriver> {
        AddressDeriver::new(self.program_id_bytes()?, self.domain_label.as_bytes())
            .map_err(|e| ClientError::Config(e.to_string()))
    }
}
