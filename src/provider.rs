//! Provider configuration and management

use alloy::network::EthereumWallet;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::Address;
use tracing::info;

use crate::config::NetworkConfig;
use crate::error::{DistributionError, Result};

/// Provider builder and manager
#[derive(Clone)]
pub struct ProviderManager {
    config: NetworkConfig,
    provider: DynProvider,
    signer_address: Option<Address>,
}

impl ProviderManager {
    /// Builds an HTTP provider with the recommended fillers, plus a wallet when a key is configured
    pub fn new(config: NetworkConfig) -> Result<Self> {
        let http_url: reqwest::Url = config
            .rpc_url
            .parse()
            .map_err(|e| DistributionError::Config(format!("Invalid RPC URL: {}", e)))?;

        let (provider, signer_address) = match config.private_key.as_deref() {
            Some(private_key) => {
                let signer: PrivateKeySigner = private_key
                    .parse()
                    .map_err(|e| DistributionError::Config(format!("Invalid private key: {}", e)))?;
                let signer_address = signer.address();

                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(http_url)
                    .erased();
                (provider, Some(signer_address))
            }
            None => (ProviderBuilder::new().connect_http(http_url).erased(), None),
        };

        Ok(Self { config, provider, signer_address })
    }

    /// Get the provider
    pub fn provider(&self) -> DynProvider {
        self.provider.clone()
    }

    /// Get signer address (if a private key is configured)
    pub fn signer_address(&self) -> Option<Address> {
        self.signer_address
    }

    /// Check connection to the RPC endpoint
    pub async fn check_connection(&self) -> Result<u64> {
        let block_number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| DistributionError::Network(format!("Failed to get block number: {}", e)))?;

        Ok(block_number)
    }

    /// Fails if the node serves a different chain than the configured one
    pub async fn verify_chain_id(&self) -> Result<u64> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| DistributionError::Network(format!("Failed to get chain id: {}", e)))?;

        if let Some(expected) = self.config.chain_id {
            if expected != chain_id {
                return Err(DistributionError::Config(format!(
                    "Chain id mismatch: configured {}, RPC reports {}",
                    expected, chain_id
                )));
            }
        }

        info!("Connected to chain {} via {}", chain_id, self.config.rpc_url);
        Ok(chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // First default anvil/hardhat development key
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn network_config(private_key: Option<&str>) -> NetworkConfig {
        NetworkConfig {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: Some(31337),
            private_key: private_key.map(str::to_string),
        }
    }

    #[test]
    fn test_provider_manager_creation() {
        let manager = ProviderManager::new(network_config(None)).unwrap();
        assert!(manager.signer_address().is_none());
    }

    #[test]
    fn test_provider_manager_with_signer() {
        let manager = ProviderManager::new(network_config(Some(DEV_KEY))).unwrap();
        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(manager.signer_address(), Some(expected));
    }

    #[test]
    fn test_provider_manager_rejects_bad_input() {
        let mut config = network_config(None);
        config.rpc_url = "not a url".to_string();
        assert!(matches!(ProviderManager::new(config), Err(DistributionError::Config(_))));

        assert!(matches!(
            ProviderManager::new(network_config(Some("0x1234"))),
            Err(DistributionError::Config(_))
        ));
    }
}
