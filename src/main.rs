use clap::Parser;
use giftbroker::application::service::{EscrowService, dispatch_all};
use giftbroker::config::Config;
use giftbroker::domain::ports::{DealStoreRef, UserStoreRef};
use giftbroker::infrastructure::in_memory::{InMemoryDealStore, InMemoryUserStore};
#[cfg(feature = "storage-rocksdb")]
use giftbroker::infrastructure::rocksdb::RocksDbStore;
use giftbroker::interfaces::csv::event_reader::EventReader;
use giftbroker::interfaces::csv::intent_writer::IntentWriter;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input chat-event CSV script (actor,name,kind,payload)
    events: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Identity of the trusted operator
    #[arg(long, env = "ADMIN_ID")]
    admin_id: i64,

    /// Fee rate in percent
    #[arg(long, env = "FEE_PERCENT", default_value = "3.0")]
    fee_percent: Decimal,

    /// Wallet address shown to buyers as the payment destination
    #[arg(long, env = "BOT_WALLET_ADDRESS", default_value = "YOUR_WALLET")]
    wallet_address: String,
}

#[cfg(feature = "storage-rocksdb")]
fn build_stores(db_path: Option<PathBuf>) -> Result<(DealStoreRef, UserStoreRef)> {
    match db_path {
        Some(path) => {
            let store = RocksDbStore::open(path).into_diagnostic()?;
            let deals: DealStoreRef = Arc::new(store.clone());
            let users: UserStoreRef = Arc::new(store);
            Ok((deals, users))
        }
        None => {
            let deals: DealStoreRef = Arc::new(InMemoryDealStore::new());
            let users: UserStoreRef = Arc::new(InMemoryUserStore::new());
            Ok((deals, users))
        }
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_stores(db_path: Option<PathBuf>) -> Result<(DealStoreRef, UserStoreRef)> {
    if db_path.is_some() {
        return Err(miette::miette!(
            "--db-path requires the storage-rocksdb feature"
        ));
    }
    let deals: DealStoreRef = Arc::new(InMemoryDealStore::new());
    let users: UserStoreRef = Arc::new(InMemoryUserStore::new());
    Ok((deals, users))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::new(cli.admin_id, cli.fee_percent, cli.wallet_address);
    let (deals, users) = build_stores(cli.db_path)?;
    let service = EscrowService::new(deals, users, config);

    let file = File::open(cli.events).into_diagnostic()?;
    let reader = EventReader::new(file);
    let dispatcher = IntentWriter::new(io::stdout()).into_diagnostic()?;

    for record in reader.events() {
        match record {
            Ok((profile, event)) => match service.handle_event(&profile, event).await {
                Ok(intents) => dispatch_all(&dispatcher, &intents).await,
                Err(e) => eprintln!("Error handling event: {}", e),
            },
            Err(e) => eprintln!("Error reading event: {}", e),
        }
    }

    Ok(())
}
