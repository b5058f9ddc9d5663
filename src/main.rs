//! Holder airdrop CLI - one batchTransfer per run

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use holder_airdrop::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let config = AppConfig::load(&cli.overrides())?;
    info!(
        "Distributing {} from {} using {}",
        config.runner.token_address,
        config.runner.distribution_contract_address,
        config.runner.recipient_source.display()
    );

    let provider_manager = ProviderManager::new(config.network.clone())?;
    let block_number = provider_manager.check_connection().await?;
    provider_manager.verify_chain_id().await?;
    info!("RPC reachable at block {}", block_number);
    if let Some(signer) = provider_manager.signer_address() {
        info!("Signing as {}", signer);
    }

    let mut runner = BatchDistributionRunner::new(config.runner, AlloyNetwork::new(&provider_manager));
    let report = runner.run().await?;

    match report.receipt {
        Some(receipt) => println!("{}", receipt.tx_hash),
        None => println!(
            "dry-run: {} recipients, total {}",
            report.recipients,
            report.total_display()
        ),
    }

    Ok(())
}

/// Logs go to stderr so stdout only carries the transaction hash
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_level.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
