use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::abi::ContractKind;

const DEFAULT_POLL_MS: u64 = 1000;
const DEFAULT_EXPLORER: &str = "https://basescan.org";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {kind} contract address {value:?}")]
    InvalidAddress { kind: ContractKind, value: String },

    #[error("invalid chain id {0:?}")]
    InvalidChainId(String),

    #[error("environment variable {0} is not set")]
    MissingEnv(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractsConfig {
    pub token: Option<String>,
    pub faucet: Option<String>,
    pub counter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: Option<String>,
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub ipc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// Name of the environment variable holding a hex private key
    pub private_key_env: Option<String>,
    #[serde(default)]
    pub account_index: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Chain writes are allowed on; unset accepts any chain
    pub chain_id: Option<u64>,

    pub explorer_url: Option<String>,

    /// Wallet-connect project id, shown for reference only
    pub project_id: Option<String>,

    #[serde(default)]
    pub contracts: ContractsConfig,

    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    #[serde(default)]
    pub abi_paths: Vec<String>,

    #[serde(default)]
    pub wallet: WalletConfig,

    pub confirmation_poll_ms: Option<u64>,
}

impl Config {
    /// Apply `DRIP_*` overrides from `lookup` (normally `std::env::var`)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = non_empty("DRIP_TOKEN_ADDRESS") {
            self.contracts.token = Some(value);
        }
        if let Some(value) = non_empty("DRIP_FAUCET_ADDRESS") {
            self.contracts.faucet = Some(value);
        }
        if let Some(value) = non_empty("DRIP_COUNTER_ADDRESS") {
            self.contracts.counter = Some(value);
        }
        if let Some(value) = non_empty("DRIP_CHAIN_ID") {
            let chain_id = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidChainId(value.clone()))?;
            self.chain_id = Some(chain_id);
        }
        if let Some(value) = non_empty("DRIP_EXPLORER_URL") {
            self.explorer_url = Some(value);
        }
        if let Some(value) = non_empty("DRIP_PROJECT_ID") {
            self.project_id = Some(value);
        }
        Ok(())
    }

    /// Configured address for `kind`; `None` when not set
    pub fn contract(&self, kind: ContractKind) -> Result<Option<Address>, ConfigError> {
        let raw = match kind {
            ContractKind::Token => &self.contracts.token,
            ContractKind::Faucet => &self.contracts.faucet,
            ContractKind::Counter => &self.contracts.counter,
        };
        let Some(raw) = raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        raw.parse::<Address>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidAddress {
                kind,
                value: raw.to_string(),
            })
    }

    pub fn explorer_url(&self) -> &str {
        self.explorer_url.as_deref().unwrap_or(DEFAULT_EXPLORER)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirmation_poll_ms.unwrap_or(DEFAULT_POLL_MS).max(50))
    }

    /// Private key from the configured environment variable, if any
    pub fn private_key<F>(&self, lookup: F) -> Result<Option<String>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(var) = self.wallet.private_key_env.as_deref() else {
            return Ok(None);
        };
        lookup(var)
            .filter(|key| !key.trim().is_empty())
            .map(Some)
            .ok_or_else(|| ConfigError::MissingEnv(var.to_string()))
    }
}

/// Load the config file; a missing file yields the defaults
pub fn load() -> anyhow::Result<Config> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    toml::from_str::<Config>(&content).with_context(|| format!("Invalid config {}", path.display()))
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("DRIP_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("drip").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("drip").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "drip", "drip")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("drip"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("drip"));
    }
    directories::ProjectDirs::from("io", "drip", "drip").map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("drip.log"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
chain_id = 84532
explorer_url = "https://sepolia.basescan.org"
confirmation_poll_ms = 250

[contracts]
token = "0x036CbD53842c5426634e7929541eC2318f3dCF7e"
faucet = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"

[[endpoints]]
name = "anvil"
rpc = "http://127.0.0.1:8545"

[wallet]
private_key_env = "DRIP_TEST_KEY"
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.chain_id, Some(84532));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.endpoints.len(), 1);
        assert!(config.contract(ContractKind::Faucet).unwrap().is_some());
        assert_eq!(config.contract(ContractKind::Counter).unwrap(), None);
        assert_eq!(config.wallet.account_index, 0);
    }

    #[test]
    fn test_env_overrides() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config
            .apply_overrides(env(&[
                ("DRIP_COUNTER_ADDRESS", "0x1111111111111111111111111111111111111111"),
                ("DRIP_CHAIN_ID", "31337"),
                ("DRIP_EXPLORER_URL", ""),
            ]))
            .unwrap();
        assert_eq!(config.chain_id, Some(31337));
        assert_eq!(
            config.contract(ContractKind::Counter).unwrap(),
            Some(Address::repeat_byte(0x11))
        );
        assert_eq!(config.explorer_url(), "https://sepolia.basescan.org");

        assert_eq!(
            config.apply_overrides(env(&[("DRIP_CHAIN_ID", "base")])),
            Err(ConfigError::InvalidChainId("base".to_string()))
        );
    }

    #[test]
    fn test_invalid_address_is_reported() {
        let mut config = Config::default();
        config.contracts.token = Some("0x1234".to_string());
        assert!(matches!(
            config.contract(ContractKind::Token),
            Err(ConfigError::InvalidAddress { kind: ContractKind::Token, .. })
        ));
    }

    #[test]
    fn test_private_key_lookup() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(
            config.private_key(env(&[])),
            Err(ConfigError::MissingEnv("DRIP_TEST_KEY".to_string()))
        );
        assert_eq!(
            config.private_key(env(&[("DRIP_TEST_KEY", "0xabc")])),
            Ok(Some("0xabc".to_string()))
        );
        assert_eq!(Config::default().private_key(env(&[])), Ok(None));
    }
}
