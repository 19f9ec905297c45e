use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use escrow_client::ClientConfig;
use escrow_ledger::LedgerConfig;

/// Settings file layout for the `escrow` binary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub client: ClientConfig,
    pub ledger: LedgerConfig,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(CliConfig::load(None).unwrap(), CliConfig::default());
    }

    #[test]
    fn sections_are_optional() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ledger]").unwrap();
        writeln!(file, "lamports_per_byte_year = 10").unwrap();

        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.ledger.lamports_per_byte_year, 10);
        assert_eq!(config.ledger.exemption_threshold_years, 2);
        assert_eq!(config.client, ClientConfig::default());
    }

    #[test]
    fn bad_toml_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client").unwrap();
        assert!(CliConfig::load(Some(file.path())).is_err());
    }
}
