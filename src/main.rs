/*!
ArcBridge CLI binary

Wires the configured chain gateways, signers, ledger, monitor and settlement
engine together and runs them until a shutdown signal arrives.
*/

use anyhow::Result;
use arcbridge::config::BridgeConfig;
use arcbridge::engine::SettlementEngine;
use arcbridge::gateway::HttpGateway;
use arcbridge::ledger::{BridgeLedger, LedgerStore};
use arcbridge::monitor::TransactionMonitor;
use arcbridge::txn::{Ed25519Signer, TxnSigner};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "arcbridge")]
#[command(about = "ArcBridge - Algorand to Voi NFT bridge oracle")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge oracle
    Start,
    /// Validate the configuration and exit
    Check,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    arcbridge::init_with_tracing(log_level);

    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path).await?,
        None => BridgeConfig::default(),
    };

    match cli.command {
        Commands::Start => {
            config.validate()?;
            run_bridge(config).await?;
        }
        Commands::Check => {
            config.validate()?;
            println!("configuration ok");
        }
        Commands::Version => {
            println!("{} v{}", arcbridge::name(), arcbridge::version());
        }
    }

    Ok(())
}

async fn run_bridge(config: BridgeConfig) -> Result<()> {
    let algorand = Arc::new(HttpGateway::new(&config.chains.algorand));
    let voi = Arc::new(HttpGateway::new(&config.chains.voi));

    let source_signer: Arc<dyn TxnSigner> = Arc::new(Ed25519Signer::from_seed(
        config.signing_seed(&config.keys.algorand)?,
    ));
    let destination_signer: Arc<dyn TxnSigner> = Arc::new(Ed25519Signer::from_seed(
        config.signing_seed(&config.keys.voi)?,
    ));
    tracing::info!(
        custodial = %source_signer.address(),
        minter = %destination_signer.address(),
        "bridge accounts resolved"
    );

    let ledger = Arc::new(BridgeLedger::new());
    let (queue_tx, queue_rx) = mpsc::channel(config.monitor.queue_capacity);
    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let monitor = TransactionMonitor::new(
        Arc::clone(&algorand),
        Arc::clone(&ledger),
        source_signer.address(),
        config.monitor.min_deposit,
        config.monitor.poll_interval(),
        queue_tx,
        cancel.clone(),
    );
    let engine = SettlementEngine::new(
        algorand,
        voi,
        Arc::clone(&ledger) as Arc<dyn LedgerStore>,
        source_signer,
        destination_signer,
        config.mint.clone(),
        queue_rx,
        cancel,
    );

    let monitor_task = tokio::spawn(monitor.run());
    let engine_task = tokio::spawn(engine.run());

    monitor_task.await?;
    engine_task.await?;
    tracing::info!("bridge stopped");
    Ok(())
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let interrupt = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = interrupt => {}
                        _ = term.recv() => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = interrupt.await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = interrupt.await;
        }
        tracing::info!("shutdown signal received");
        cancel.cancel();
    });
}
