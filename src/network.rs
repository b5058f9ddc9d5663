//! Network seam between the runner and the chain

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;

use crate::batch::TransferBatch;
use crate::error::Result;

/// A deployed contract resolved by address and interface name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractHandle {
    pub address: Address,
    pub interface_name: String,
}

/// A submitted transaction that has not been confirmed yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransfer {
    pub tx_hash: B256,
}

/// Confirmation record for an included transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// `false` when the transaction was included but reverted
    pub success: bool,
}

/// Chain access needed by a distribution run.
///
/// `AlloyNetwork` talks to a JSON-RPC node; tests use a recording mock.
#[async_trait]
pub trait DistributionNetwork: Send + Sync {
    /// Resolves a deployed contract, failing if no code lives at `address`
    async fn get_contract(&self, address: Address, interface_name: &str) -> Result<ContractHandle>;

    /// Sends `batchTransfer(token, addresses, amounts)` to the distribution contract
    async fn batch_transfer(
        &self,
        contract: &ContractHandle,
        token: Address,
        batch: &TransferBatch,
    ) -> Result<PendingTransfer>;

    /// Waits until the transaction has `confirmations` blocks on top of it
    async fn wait_for_receipt(&self, pending: &PendingTransfer, confirmations: u64) -> Result<TransferReceipt>;

    /// ERC-20 `decimals()` of the token
    async fn token_decimals(&self, token: Address) -> Result<u8>;

    /// ERC-20 `balanceOf(holder)` of the token
    async fn token_balance(&self, token: Address, holder: Address) -> Result<U256>;
}
