//! One end-to-end distribution cycle
//!
//! `Idle -> Loaded -> Normalized -> Submitted -> Confirmed`, any failure moves
//! the runner to `Failed`. A dry run stops at `Normalized`.

use alloy_primitives::{Address, U256};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::amount::format_base_units;
use crate::batch::{normalize, TransferBatch};
use crate::config::RunnerConfig;
use crate::error::{DistributionError, Result};
use crate::network::{ContractHandle, DistributionNetwork, PendingTransfer, TransferReceipt};
use crate::recipients::{load_recipients, RecipientSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Loaded,
    Normalized,
    Submitted,
    Confirmed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Confirmed | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Loaded => "loaded",
            RunState::Normalized => "normalized",
            RunState::Submitted => "submitted",
            RunState::Confirmed => "confirmed",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a run; `receipt` is `None` for dry runs
#[derive(Debug, Clone)]
pub struct DistributionReport {
    pub recipients: usize,
    pub total: U256,
    pub decimals: u8,
    pub receipt: Option<TransferReceipt>,
}

impl DistributionReport {
    /// Batch total in token units, e.g. `3.5`
    pub fn total_display(&self) -> String {
        format_base_units(self.total, self.decimals)
    }
}

/// Sends the batch to the distribution contract. No retry on rejection.
///
/// Equal `addresses`/`amounts` lengths are guaranteed by [`TransferBatch::from_parts`].
pub async fn submit_batch<N: DistributionNetwork + ?Sized>(
    network: &N,
    contract: &ContractHandle,
    token: Address,
    batch: &TransferBatch,
) -> Result<PendingTransfer> {
    if batch.is_empty() {
        return Err(DistributionError::Submission("Refusing to submit an empty batch".to_string()));
    }

    network.batch_transfer(contract, token, batch).await
}

/// Waits for inclusion, bounded by `timeout`; a reverted receipt is an error.
pub async fn await_confirmation<N: DistributionNetwork + ?Sized>(
    network: &N,
    pending: &PendingTransfer,
    confirmations: u64,
    timeout: Duration,
) -> Result<TransferReceipt> {
    let receipt = tokio::time::timeout(timeout, network.wait_for_receipt(pending, confirmations))
        .await
        .map_err(|_| {
            DistributionError::Confirmation(format!(
                "Timed out after {}s waiting for {}",
                timeout.as_secs_f64(),
                pending.tx_hash
            ))
        })??;

    if !receipt.success {
        return Err(DistributionError::Confirmation(format!(
            "Transaction {} reverted in block {}",
            receipt.tx_hash,
            receipt.block_number.map_or_else(|| "unknown".to_string(), |b| b.to_string())
        )));
    }

    Ok(receipt)
}

pub struct BatchDistributionRunner<N> {
    config: RunnerConfig,
    network: N,
    state: RunState,
}

impl<N: DistributionNetwork> BatchDistributionRunner<N> {
    pub fn new(config: RunnerConfig, network: N) -> Self {
        Self { config, network, state: RunState::Idle }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Executes one cycle. A runner can only be run once.
    pub async fn run(&mut self) -> Result<DistributionReport> {
        if self.state != RunState::Idle {
            return Err(DistributionError::Config(format!(
                "Runner already used (state: {})",
                self.state
            )));
        }

        let result = self.execute().await;
        if let Err(e) = &result {
            error!(kind = e.kind(), state = %self.state, "Distribution failed: {}", e);
            self.state = RunState::Failed;
        }
        result
    }

    async fn execute(&mut self) -> Result<DistributionReport> {
        let source = RecipientSource {
            path: self.config.recipient_source.clone(),
            holder_unit_amount: self.config.holder_unit_amount,
        };
        let recipients = load_recipients(&source).await?;
        self.advance(RunState::Loaded);

        let decimals = self.config.decimal_scale;
        let batch = normalize(&recipients, decimals)?;
        self.advance(RunState::Normalized);
        info!(
            "Normalized {} recipients, total {} ({} base units)",
            batch.len(),
            format_base_units(batch.total(), decimals),
            batch.total()
        );

        let contract = self
            .network
            .get_contract(self.config.distribution_contract_address, &self.config.interface_name)
            .await?;
        self.preflight(&contract, &batch).await?;

        let mut report = DistributionReport {
            recipients: batch.len(),
            total: batch.total(),
            decimals,
            receipt: None,
        };

        if self.config.dry_run {
            info!("Dry run: skipping submission of {} transfers", batch.len());
            return Ok(report);
        }

        let pending = submit_batch(&self.network, &contract, self.config.token_address, &batch).await?;
        self.advance(RunState::Submitted);

        let receipt = await_confirmation(
            &self.network,
            &pending,
            self.config.confirmations,
            self.config.confirmation_timeout,
        )
        .await?;
        self.advance(RunState::Confirmed);

        info!(
            "Transaction {} confirmed in block {:?}, gas used {}",
            receipt.tx_hash, receipt.block_number, receipt.gas_used
        );
        report.receipt = Some(receipt);
        Ok(report)
    }

    async fn preflight(&self, contract: &ContractHandle, batch: &TransferBatch) -> Result<()> {
        let token = self.config.token_address;

        if self.config.verify_decimals {
            let on_chain = self.network.token_decimals(token).await?;
            if on_chain != self.config.decimal_scale {
                return Err(DistributionError::Config(format!(
                    "Token {} has {} decimals, configured scale is {}",
                    token, on_chain, self.config.decimal_scale
                )));
            }
        }

        if self.config.check_balance {
            let balance = self.network.token_balance(token, contract.address).await?;
            if balance < batch.total() {
                return Err(DistributionError::Submission(format!(
                    "Insufficient treasury balance: {} holds {}, batch needs {}",
                    contract.address,
                    format_base_units(balance, self.config.decimal_scale),
                    format_base_units(batch.total(), self.config.decimal_scale)
                )));
            }
            debug!("Treasury balance {} covers batch total {}", balance, batch.total());
        }

        Ok(())
    }

    fn advance(&mut self, next: RunState) {
        debug!("Runner state {} -> {}", self.state, next);
        self.state = next;
    }
}
