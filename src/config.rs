//! Layered runner settings: config file, `DISTRIBUTOR_*` environment, command line

use alloy_primitives::Address;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::amount::DecimalAmount;
use crate::error::{DistributionError, Result};

/// Looked up in the working directory (any extension `config` understands)
pub const DEFAULT_CONFIG_NAME: &str = "distributor";
/// `DISTRIBUTOR_NETWORK__PRIVATE_KEY` → `network.private_key`
pub const ENV_PREFIX: &str = "DISTRIBUTOR";

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_DECIMALS: u8 = 18;
pub const DEFAULT_INTERFACE_NAME: &str = "IBatchTransfer";
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONFIRMATIONS: u64 = 1;
/// 10^77 is the largest power of ten representable in uint256
pub const MAX_DECIMALS: u8 = 77;

/// Raw layered settings, validated into [`AppConfig`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub distribution: DistributionSettings,
    #[serde(default)]
    pub network: NetworkSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistributionSettings {
    pub recipient_source: Option<String>,
    pub token_address: Option<String>,
    pub contract_address: Option<String>,
    pub decimals: Option<u8>,
    pub interface_name: Option<String>,
    pub holder_unit_amount: Option<String>,
    pub verify_decimals: Option<bool>,
    pub check_balance: Option<bool>,
    pub dry_run: Option<bool>,
    pub confirmation_timeout_secs: Option<u64>,
    pub confirmations: Option<u64>,
}

#[derive(Clone, Default, Deserialize)]
pub struct NetworkSettings {
    pub rpc_url: Option<String>,
    pub chain_id: Option<u64>,
    pub private_key: Option<String>,
}

impl fmt::Debug for NetworkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkSettings")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Everything one distribution run needs, passed to the runner at construction
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub recipient_source: PathBuf,
    pub token_address: Address,
    pub distribution_contract_address: Address,
    pub decimal_scale: u8,
    pub interface_name: String,
    pub holder_unit_amount: Option<DecimalAmount>,
    pub verify_decimals: bool,
    pub check_balance: bool,
    pub dry_run: bool,
    pub confirmation_timeout: Duration,
    pub confirmations: u64,
}

impl RunnerConfig {
    /// Config with defaults for everything but the four required options
    pub fn new(
        recipient_source: impl Into<PathBuf>,
        token_address: Address,
        distribution_contract_address: Address,
        decimal_scale: u8,
    ) -> Self {
        Self {
            recipient_source: recipient_source.into(),
            token_address,
            distribution_contract_address,
            decimal_scale,
            interface_name: DEFAULT_INTERFACE_NAME.to_string(),
            holder_unit_amount: None,
            verify_decimals: false,
            check_balance: true,
            dry_run: false,
            confirmation_timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            confirmations: DEFAULT_CONFIRMATIONS,
        }
    }
}

#[derive(Clone)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: Option<u64>,
    pub private_key: Option<String>,
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub runner: RunnerConfig,
    pub network: NetworkConfig,
}

/// Command-line values layered over file and environment settings
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub recipient_source: Option<PathBuf>,
    pub token_address: Option<String>,
    pub contract_address: Option<String>,
    pub decimals: Option<u8>,
    pub holder_unit_amount: Option<String>,
    pub rpc_url: Option<String>,
    pub chain_id: Option<u64>,
    pub private_key: Option<String>,
    pub confirmations: Option<u64>,
    pub confirmation_timeout_secs: Option<u64>,
    pub dry_run: bool,
}

impl AppConfig {
    /// Loads config file, then `DISTRIBUTOR_*` environment, then overrides
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let file = match &overrides.config_path {
            Some(path) => config::File::from(path.as_path()).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option(
                "distribution.recipient_source",
                overrides.recipient_source.as_ref().map(|p| p.display().to_string()),
            )?
            .set_override_option("distribution.token_address", overrides.token_address.clone())?
            .set_override_option("distribution.contract_address", overrides.contract_address.clone())?
            .set_override_option("distribution.decimals", overrides.decimals.map(|d| d.to_string()))?
            .set_override_option("distribution.holder_unit_amount", overrides.holder_unit_amount.clone())?
            .set_override_option("distribution.confirmations", overrides.confirmations.map(|c| c.to_string()))?
            .set_override_option(
                "distribution.confirmation_timeout_secs",
                overrides.confirmation_timeout_secs.map(|t| t.to_string()),
            )?
            .set_override_option("distribution.dry_run", overrides.dry_run.then_some(true))?
            .set_override_option("network.rpc_url", overrides.rpc_url.clone())?
            .set_override_option("network.chain_id", overrides.chain_id.map(|c| c.to_string()))?
            .set_override_option("network.private_key", overrides.private_key.clone())?;

        let settings: Settings = builder.build()?.try_deserialize()?;
        Self::from_settings(settings)
    }

    /// Validates raw settings and applies defaults
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let Settings { distribution, network } = settings;

        let recipient_source = required(distribution.recipient_source, "distribution.recipient_source")?;
        let token_address = parse_address(
            &required(distribution.token_address, "distribution.token_address")?,
            "distribution.token_address",
        )?;
        let distribution_contract_address = parse_address(
            &required(distribution.contract_address, "distribution.contract_address")?,
            "distribution.contract_address",
        )?;

        let decimal_scale = distribution.decimals.unwrap_or(DEFAULT_DECIMALS);
        if decimal_scale > MAX_DECIMALS {
            return Err(DistributionError::Config(format!(
                "distribution.decimals must be at most {}, got {}",
                MAX_DECIMALS, decimal_scale
            )));
        }

        let holder_unit_amount = distribution
            .holder_unit_amount
            .map(|text| {
                let amount: DecimalAmount = text.parse().map_err(|e| {
                    DistributionError::Config(format!("distribution.holder_unit_amount: {}", e))
                })?;
                if amount.is_negative() {
                    return Err(DistributionError::Config(format!(
                        "distribution.holder_unit_amount must not be negative, got {}",
                        text
                    )));
                }
                Ok(amount)
            })
            .transpose()?;

        let timeout_secs = distribution
            .confirmation_timeout_secs
            .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(DistributionError::Config(
                "distribution.confirmation_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let confirmations = distribution.confirmations.unwrap_or(DEFAULT_CONFIRMATIONS);
        if confirmations == 0 {
            return Err(DistributionError::Config(
                "distribution.confirmations must be at least 1".to_string(),
            ));
        }

        let dry_run = distribution.dry_run.unwrap_or(false);
        let private_key = network.private_key.filter(|key| !key.trim().is_empty());
        if private_key.is_none() && !dry_run {
            return Err(DistributionError::Config(
                "network.private_key is required unless running with dry_run".to_string(),
            ));
        }

        Ok(Self {
            runner: RunnerConfig {
                recipient_source: PathBuf::from(recipient_source),
                token_address,
                distribution_contract_address,
                decimal_scale,
                interface_name: distribution
                    .interface_name
                    .unwrap_or_else(|| DEFAULT_INTERFACE_NAME.to_string()),
                holder_unit_amount,
                verify_decimals: distribution.verify_decimals.unwrap_or(false),
                check_balance: distribution.check_balance.unwrap_or(true),
                dry_run,
                confirmation_timeout: Duration::from_secs(timeout_secs),
                confirmations,
            },
            network: NetworkConfig {
                rpc_url: network.rpc_url.unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
                chain_id: network.chain_id,
                private_key,
            },
        })
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DistributionError::Config(format!("{} is required", key)))
}

fn parse_address(text: &str, key: &str) -> Result<Address> {
    text.trim()
        .parse()
        .map_err(|e| DistributionError::Config(format!("{}: invalid address {:?}: {}", key, text, e)))
}
