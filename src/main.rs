use clap::Parser;
use gig_escrow::application::engine::Engine;
use gig_escrow::config::Settings;
use gig_escrow::domain::asset::AssetKind;
use gig_escrow::domain::ports::{
    DepositAddressProviderRef, DepositVerifierRef, NotificationSinkRef, Stores,
};
use gig_escrow::error::EscrowError;
use gig_escrow::infrastructure::address::StaticAddressProvider;
use gig_escrow::infrastructure::in_memory;
use gig_escrow::infrastructure::notify::TracingNotifier;
use gig_escrow::infrastructure::verifier::{AcceptAllVerifier, RejectAllVerifier};
use gig_escrow::interfaces::csv::event_reader::EventReader;
use gig_escrow::interfaces::replay::Replay;
use gig_escrow::interfaces::report;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input marketplace events CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn open_stores(db_path: Option<PathBuf>) -> gig_escrow::error::Result<Stores> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let backend = gig_escrow::infrastructure::rocksdb::RocksDbStores::open(path)?;
            Ok(backend.stores())
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(in_memory::stores())
        }
        None => Ok(in_memory::stores()),
    }
}

/// Resolves the deposit verifier for every supported asset up front, per the
/// configured provider. An unknown provider fails startup.
fn resolve_verifiers(
    settings: &Settings,
) -> gig_escrow::error::Result<HashMap<AssetKind, DepositVerifierRef>> {
    let verifier: DepositVerifierRef = match settings.payments_provider.as_str() {
        "mock" | "accept" => Arc::new(AcceptAllVerifier),
        "reject" => Arc::new(RejectAllVerifier),
        other => {
            return Err(EscrowError::InvalidInput(format!(
                "unknown payments provider '{other}'"
            )));
        }
    };
    Ok(AssetKind::ALL
        .into_iter()
        .map(|asset| (asset, verifier.clone()))
        .collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    let stores = open_stores(cli.db_path).into_diagnostic()?;
    let verifiers = resolve_verifiers(&settings).into_diagnostic()?;
    let addresses: DepositAddressProviderRef = Arc::new(StaticAddressProvider::new());
    let notifier: NotificationSinkRef = Arc::new(TracingNotifier);

    let (engine, worker) = Engine::new(stores, verifiers, addresses, notifier, settings)
        .await
        .into_diagnostic()?;
    let worker_handle = tokio::spawn(worker.run());

    // Replay events
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    let replay = Replay::new(engine.clone());
    for event_result in reader.events() {
        match event_result {
            Ok(event) => {
                if let Err(e) = replay.apply(event).await {
                    eprintln!("Error processing event: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading event: {}", e);
            }
        }
    }

    // Let the payout worker settle everything queued before reporting.
    engine.close_payout_queue();
    worker_handle.await.into_diagnostic()?;

    // Output final state
    let orders = report::render_orders(&engine).await.into_diagnostic()?;
    let wallets = report::render_wallets(&engine).await.into_diagnostic()?;
    print!("{orders}");
    println!();
    print!("{wallets}");

    Ok(())
}
