//! Holder airdrop: batch ERC-20 distribution runner
//!
//! Reads a recipient → amount list, scales every amount to the token's
//! fixed-point representation, submits a single `batchTransfer` call to a
//! pre-deployed distribution contract and waits for the receipt.
//!
//! # Example
//!
//! ```rust,no_run
//! use holder_airdrop::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(&ConfigOverrides::default())?;
//!
//!     let provider_manager = ProviderManager::new(config.network.clone())?;
//!     provider_manager.verify_chain_id().await?;
//!
//!     let mut runner = BatchDistributionRunner::new(
//!         config.runner.clone(),
//!         AlloyNetwork::new(&provider_manager),
//!     );
//!     let report = runner.run().await?;
//!
//!     if let Some(receipt) = report.receipt {
//!         println!("{}", receipt.tx_hash);
//!     }
//!     Ok(())
//! }
//! ```

pub mod amount;
pub mod batch;
pub mod config;
pub mod contract;
pub mod error;
pub mod network;
pub mod provider;
pub mod recipients;
pub mod runner;

pub use amount::{format_base_units, scale_amount, AmountError, DecimalAmount};
pub use batch::{normalize, TransferBatch};
pub use crate::config::{AppConfig, ConfigOverrides, NetworkConfig, RunnerConfig};
pub use contract::AlloyNetwork;
pub use error::{DistributionError, Result};
pub use network::{ContractHandle, DistributionNetwork, PendingTransfer, TransferReceipt};
pub use provider::ProviderManager;
pub use recipients::{load_recipients, parse_recipients, RecipientEntry, RecipientList, RecipientSource};
pub use runner::{await_confirmation, submit_batch, BatchDistributionRunner, DistributionReport, RunState};

pub use alloy_primitives::{Address, B256, U256};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AppConfig, ConfigOverrides, RunnerConfig};
    pub use crate::contract::AlloyNetwork;
    pub use crate::error::{DistributionError, Result};
    pub use crate::network::DistributionNetwork;
    pub use crate::provider::ProviderManager;
    pub use crate::runner::{BatchDistributionRunner, DistributionReport, RunState};
    pub use alloy_primitives::{Address, U256};
}
