use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vendsim::application::machine::VendingMachine;
use vendsim::config::CoinSettings;
use vendsim::domain::change::BoundedChangeSolver;
use vendsim::domain::ledger::CoinLedger;
use vendsim::infrastructure::in_memory::InMemoryProductStore;
use vendsim::interfaces::console::Console;
use vendsim::interfaces::csv::coin_reader::CoinReader;
use vendsim::interfaces::csv::inventory_writer::InventoryWriter;
use vendsim::interfaces::csv::product_reader::ProductReader;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with the accepted denominations and their scale.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Coins to preload, one `denomination,count` per line.
    #[arg(long)]
    coins: Option<PathBuf>,

    /// Products on sale, one `id,name,price` per line.
    #[arg(long)]
    products: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Write the final coin inventory as CSV to stdout when the session ends.
    #[arg(long)]
    print_inventory: bool,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

async fn load_coins(machine: &VendingMachine, path: &Path) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    for stock in CoinReader::new(file).coins() {
        match stock {
            Ok(stock) => {
                if let Err(e) = machine.load_coins(stock.denomination, stock.count).await {
                    error!(
                        denomination = %stock.denomination,
                        count = stock.count,
                        "Error loading coins: {e}"
                    );
                }
            }
            Err(e) => error!("Error reading coin line: {e}"),
        }
    }
    Ok(())
}

async fn load_products(machine: &VendingMachine, path: &Path) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    for product in ProductReader::new(file).products() {
        match product {
            Ok(product) => machine.load_product(product).await.into_diagnostic()?,
            Err(e) => error!("Error reading product line: {e}"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let settings = match &cli.settings {
        Some(path) => CoinSettings::load(path).into_diagnostic()?,
        None => CoinSettings::default(),
    };
    info!(scale = settings.scale, denominations = ?settings.denominations, "Coin settings loaded");

    let converter = settings.converter().into_diagnostic()?;
    let ledger = CoinLedger::new(Box::new(BoundedChangeSolver::new()), &settings.denominations);
    let machine = VendingMachine::new(ledger, Box::new(InMemoryProductStore::new()), converter);

    if let Some(path) = &cli.coins {
        load_coins(&machine, path).await?;
    }
    if let Some(path) = &cli.products {
        load_products(&machine, path).await?;
    }

    let stdin = BufReader::new(tokio::io::stdin());
    Console::new(&machine, io::stdout().lock())
        .run(stdin)
        .await
        .into_diagnostic()?;

    if cli.print_inventory {
        let inventory = machine.inventory().await;
        let mut writer = InventoryWriter::new(io::stdout().lock());
        writer.write_inventory(&inventory).into_diagnostic()?;
    }

    Ok(())
}
