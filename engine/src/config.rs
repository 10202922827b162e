//! Deployment configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use nxd_bridge::BridgeMode;
use nxd_ledger::TokenMetadata;
use nxd_types::{Address, Amount, DEFAULT_DECIMALS};
use nxd_utils::LogFormat;

use crate::EngineError;

/// Everything needed to deploy an engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Whole-token quantities are scaled
/// by `10^decimals` at deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Token name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Token ticker.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Initial supply in whole tokens, credited to `owner`.
    #[serde(default = "default_initial_supply")]
    pub initial_supply: u64,

    /// Deployer and ledger owner.
    #[serde(default = "default_owner")]
    pub owner: Address,

    /// Seed the staking pool and bridge custody addresses are derived from.
    #[serde(default = "default_custody_seed")]
    pub custody_seed: String,

    /// Staking reward rate in parts per 10^18 of principal per second.
    #[serde(default = "default_reward_rate")]
    pub reward_rate: u64,

    /// Whole tokens moved from `owner` into the staking pool's reward
    /// reserve at deploy. Must not exceed `initial_supply`.
    #[serde(default = "default_initial_reward_reserve")]
    pub initial_reward_reserve: u64,

    #[serde(default)]
    pub bridge_mode: BridgeMode,

    /// Bridge operator. Defaults to `owner`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_operator: Option<Address>,

    /// Largest single outbound lock, in whole tokens. Unlimited when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lock_per_transfer: Option<u64>,

    /// Grant the bridge custody address the mint capability after deploy.
    #[serde(default = "default_true")]
    pub register_bridge_minter: bool,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_name() -> String {
    TokenMetadata::default().name
}

fn default_symbol() -> String {
    TokenMetadata::default().symbol
}

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

fn default_initial_supply() -> u64 {
    1_000_000_000
}

fn default_owner() -> Address {
    Address::derive("nxd/deployer", b"dev")
}

fn default_custody_seed() -> String {
    "nxd".to_string()
}

/// 10^9 per 10^18 per second, roughly 3.15% a year.
fn default_reward_rate() -> u64 {
    1_000_000_000
}

/// 0.1% of the default supply. Covers a million token-years at the
/// default rate.
fn default_initial_reward_reserve() -> u64 {
    1_000_000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn metadata(&self) -> TokenMetadata {
        TokenMetadata {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
        }
    }

    pub fn operator(&self) -> Address {
        self.bridge_operator.unwrap_or(self.owner)
    }

    pub fn staking_custody(&self) -> Address {
        Address::derive("nxd/staking", self.custody_seed.as_bytes())
    }

    pub fn bridge_custody(&self) -> Address {
        Address::derive("nxd/bridge", self.custody_seed.as_bytes())
    }

    /// Per-transfer lock limit in raw units.
    pub fn lock_limit(&self) -> Result<Option<Amount>, EngineError> {
        self.max_lock_per_transfer
            .map(|whole| {
                Amount::from_tokens(u128::from(whole), self.decimals).ok_or_else(|| {
                    EngineError::Config(format!(
                        "max_lock_per_transfer {whole} overflows at {} decimals",
                        self.decimals
                    ))
                })
            })
            .transpose()
    }

    /// Deploy-time reward reserve in raw units.
    pub fn reward_reserve(&self) -> Result<Amount, EngineError> {
        Amount::from_tokens(u128::from(self.initial_reward_reserve), self.decimals).ok_or_else(
            || {
                EngineError::Config(format!(
                    "initial_reward_reserve {} overflows at {} decimals",
                    self.initial_reward_reserve, self.decimals
                ))
            },
        )
    }

    /// Reject settings that cannot produce a working deployment.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.owner.is_zero() {
            return Err(EngineError::Config("owner must not be the zero address".into()));
        }
        if self.symbol.trim().is_empty() {
            return Err(EngineError::Config("symbol must not be empty".into()));
        }
        if self.operator().is_zero() {
            return Err(EngineError::Config(
                "bridge_operator must not be the zero address".into(),
            ));
        }
        if self.staking_custody() == self.bridge_custody() {
            return Err(EngineError::Config("custody addresses collide".into()));
        }
        if self.bridge_mode == BridgeMode::BurnMint && !self.register_bridge_minter {
            return Err(EngineError::Config(
                "burn_mint bridge needs register_bridge_minter = true".into(),
            ));
        }
        if self.initial_reward_reserve > self.initial_supply {
            return Err(EngineError::Config(format!(
                "initial_reward_reserve {} exceeds initial_supply {}",
                self.initial_reward_reserve, self.initial_supply
            )));
        }
        self.lock_limit()?;
        self.reward_reserve()?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            initial_supply: default_initial_supply(),
            owner: default_owner(),
            custody_seed: default_custody_seed(),
            reward_rate: default_reward_rate(),
            initial_reward_reserve: default_initial_reward_reserve(),
            bridge_mode: BridgeMode::default(),
            bridge_operator: None,
            max_lock_per_transfer: None,
            register_bridge_minter: default_true(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = EngineConfig {
            bridge_operator: Some(Address::new([7; 20])),
            max_lock_per_transfer: Some(10_000),
            ..EngineConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = EngineConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.name, "Quantum Zero-Chain Token");
        assert_eq!(config.symbol, "NXD");
        assert_eq!(config.decimals, 18);
        assert_eq!(config.initial_supply, 1_000_000_000);
        assert_eq!(config.initial_reward_reserve, 1_000_000);
        assert_eq!(config.bridge_mode, BridgeMode::LockRelease);
        assert!(config.register_bridge_minter);
        assert_eq!(config.operator(), config.owner);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            initial_supply = 1000000
            bridge_mode = "burn_mint"
            log_format = "json"
        "#;
        let config = EngineConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.initial_supply, 1_000_000);
        assert_eq!(config.bridge_mode, BridgeMode::BurnMint);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.symbol, "NXD"); // default
    }

    #[test]
    fn malformed_owner_is_a_config_error() {
        let err = EngineConfig::from_toml_str(r#"owner = "0x1234""#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = EngineConfig::from_toml_file("/nonexistent/nxd.toml");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn lock_limit_scales_by_decimals() {
        let config = EngineConfig {
            decimals: 6,
            max_lock_per_transfer: Some(5),
            ..EngineConfig::default()
        };
        assert_eq!(config.lock_limit().unwrap(), Some(Amount::new(5_000_000)));
    }

    #[test]
    fn validate_rejects_burn_mint_without_minter() {
        let config = EngineConfig {
            bridge_mode: BridgeMode::BurnMint,
            register_bridge_minter: false,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_reserve_beyond_supply() {
        let config = EngineConfig {
            initial_supply: 100,
            initial_reward_reserve: 101,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));

        let config = EngineConfig {
            initial_reward_reserve: 100,
            ..config
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.reward_reserve().unwrap(), Amount::from_tokens(100, 18).unwrap());
    }
}
