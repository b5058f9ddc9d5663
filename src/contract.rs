//! Distribution contract client over alloy

use alloy::network::ReceiptResponse;
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider};
use alloy::sol;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::batch::TransferBatch;
use crate::error::{DistributionError, Result};
use crate::network::{ContractHandle, DistributionNetwork, PendingTransfer, TransferReceipt};
use crate::provider::ProviderManager;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IBatchTransfer {
        function batchTransfer(address token, address[] calldata recipients, uint256[] calldata amounts) external;
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
    }
}

/// `DistributionNetwork` backed by a JSON-RPC node
pub struct AlloyNetwork {
    provider: DynProvider,
    signer_address: Option<Address>,
}

impl AlloyNetwork {
    pub fn new(provider_manager: &ProviderManager) -> Self {
        Self {
            provider: provider_manager.provider(),
            signer_address: provider_manager.signer_address(),
        }
    }
}

#[async_trait]
impl DistributionNetwork for AlloyNetwork {
    async fn get_contract(&self, address: Address, interface_name: &str) -> Result<ContractHandle> {
        let code = self
            .provider
            .get_code_at(address)
            .await
            .map_err(|e| DistributionError::Network(format!("Failed to get code at {}: {}", address, e)))?;

        if code.is_empty() {
            return Err(DistributionError::Config(format!(
                "No {} contract deployed at {}",
                interface_name, address
            )));
        }

        debug!("Resolved {} at {} ({} bytes of code)", interface_name, address, code.len());
        Ok(ContractHandle {
            address,
            interface_name: interface_name.to_string(),
        })
    }

    async fn batch_transfer(
        &self,
        contract: &ContractHandle,
        token: Address,
        batch: &TransferBatch,
    ) -> Result<PendingTransfer> {
        let sender = self.signer_address.ok_or_else(|| {
            DistributionError::Submission("No private key configured for signing".to_string())
        })?;

        info!(
            "Submitting batchTransfer of {} recipients to {} from {}",
            batch.len(),
            contract.address,
            sender
        );

        let (addresses, amounts) = batch.clone().into_parts();
        let pending = IBatchTransfer::new(contract.address, self.provider.clone())
            .batchTransfer(token, addresses, amounts)
            .send()
            .await
            .map_err(|e| DistributionError::Submission(format!("batchTransfer rejected: {}", e)))?;

        let tx_hash = *pending.tx_hash();
        info!("Transaction sent: {}", tx_hash);
        Ok(PendingTransfer { tx_hash })
    }

    async fn wait_for_receipt(&self, pending: &PendingTransfer, confirmations: u64) -> Result<TransferReceipt> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), pending.tx_hash)
            .with_required_confirmations(confirmations)
            .get_receipt()
            .await
            .map_err(|e| DistributionError::Confirmation(format!("Failed to get receipt: {}", e)))?;

        Ok(TransferReceipt {
            tx_hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
            success: receipt.status(),
        })
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        IERC20::new(token, self.provider.clone())
            .decimals()
            .call()
            .await
            .map_err(|e| DistributionError::Network(format!("decimals() call failed on {}: {}", token, e)))
    }

    async fn token_balance(&self, token: Address, holder: Address) -> Result<U256> {
        IERC20::new(token, self.provider.clone())
            .balanceOf(holder)
            .call()
            .await
            .map_err(|e| DistributionError::Network(format!("balanceOf() call failed on {}: {}", token, e)))
    }
}
