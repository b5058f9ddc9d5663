//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

use holder_airdrop::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "holder-airdrop")]
#[command(about = "Distribute tokens to a holder list with a single batchTransfer call", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (TOML/YAML); defaults to ./distributor.* when present
    #[arg(short, long, env = "DISTRIBUTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Recipient JSON file (address -> amount mapping or holder list)
    #[arg(short = 'f', long)]
    pub recipients: Option<PathBuf>,

    /// Token being distributed
    #[arg(short, long)]
    pub token: Option<String>,

    /// Distribution (treasury) contract address
    #[arg(short = 'a', long)]
    pub contract: Option<String>,

    /// Token decimal places used for scaling
    #[arg(short, long)]
    pub decimals: Option<u8>,

    /// Tokens per unit for holder list input (e.g. tokens per NFT)
    #[arg(short = 'u', long)]
    pub holder_unit_amount: Option<String>,

    /// RPC endpoint URL
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Expected chain ID
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Private key for signing the transaction
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Blocks required on top of the transaction
    #[arg(long)]
    pub confirmations: Option<u64>,

    /// Confirmation timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Load, scale and check the batch without submitting it
    #[arg(long)]
    pub dry_run: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            recipient_source: self.recipients.clone(),
            token_address: self.token.clone(),
            contract_address: self.contract.clone(),
            decimals: self.decimals,
            holder_unit_amount: self.holder_unit_amount.clone(),
            rpc_url: self.rpc_url.clone(),
            chain_id: self.chain_id,
            private_key: self.private_key.clone(),
            confirmations: self.confirmations,
            confirmation_timeout_secs: self.timeout,
            dry_run: self.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::try_parse_from([
            "holder-airdrop",
            "--recipients",
            "holders.json",
            "--token",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "--decimals",
            "6",
            "--timeout",
            "30",
            "--dry-run",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.recipient_source, Some(PathBuf::from("holders.json")));
        assert_eq!(overrides.decimals, Some(6));
        assert_eq!(overrides.confirmation_timeout_secs, Some(30));
        assert!(overrides.dry_run);
        assert!(overrides.contract_address.is_none());
    }

    #[test]
    fn test_rejects_out_of_range_decimals() {
        assert!(Cli::try_parse_from(["holder-airdrop", "--decimals", "300"]).is_err());
    }
}
