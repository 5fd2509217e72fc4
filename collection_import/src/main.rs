//! Collection Import - MTG collection reconciliation
//!
//! Imports CSV collection exports (TCGplayer, ManaBox) into named collections,
//! matching every row against Scryfall and pricing it by its printed finish.

use clap::{Parser, Subcommand};
use collection_import::{
    CollectionService, ImportConfig, ImportLog, ImportSummary, Reconciler, ScryfallCatalog,
    SqliteStore, DEFAULT_CATALOG_URL,
};
use std::path::PathBuf;
use std::time::Duration;

/// MTG collection import - reconciles CSV exports against Scryfall
#[derive(Parser, Debug)]
#[command(name = "collection_import")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, env = "COLLECTION_DB", default_value_t = default_db_path())]
    database: String,

    /// Owner the collections belong to
    #[arg(short, long, env = "COLLECTION_OWNER", default_value = "default")]
    owner: String,

    /// Scryfall API base URL
    #[arg(long, env = "SCRYFALL_API_URL", default_value = DEFAULT_CATALOG_URL)]
    catalog_url: String,

    /// Collection lookups in flight at once (1 = sequential)
    #[arg(long, default_value_t = 2)]
    batch_concurrency: usize,

    /// Fallback lookups in flight per batch
    #[arg(long, default_value_t = 4)]
    fallback_concurrency: usize,

    /// Timeout for each Scryfall request, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty collection
    Create { name: String },
    /// Import a CSV export into an existing collection
    Import {
        name: String,
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Show the cards and totals of a collection
    Show {
        name: String,
        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List all collections
    List,
    /// Remove every card from a collection
    Clear { name: String },
    /// Delete a collection and its cards
    Delete { name: String },
}

/// Returns the default database path: ~/.local/share/collection_import/collections.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("collection_import")
        .join("collections.db")
        .to_string_lossy()
        .to_string()
}

type Service = CollectionService<ScryfallCatalog, SqliteStore>;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ImportConfig {
        catalog_url: args.catalog_url.clone(),
        batch_concurrency: args.batch_concurrency,
        fallback_concurrency: args.fallback_concurrency,
        request_timeout: Duration::from_secs(args.timeout_secs),
        ..ImportConfig::default()
    };

    let mut service = match build_service(&args, config) {
        Ok(service) => service,
        Err(e) => {
            log::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&mut service, args.command).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn build_service(args: &Args, config: ImportConfig) -> collection_import::Result<Service> {
    let db_path = PathBuf::from(&args.database);
    log::info!("Database path: {}", db_path.display());

    let catalog = ScryfallCatalog::new(&config)?;
    let reconciler = Reconciler::new(catalog, config, ImportLog::process("import"))?;
    let store = SqliteStore::open(&db_path)?;
    Ok(CollectionService::new(reconciler, store, args.owner.clone()))
}

async fn run(service: &mut Service, command: Command) -> collection_import::Result<()> {
    match command {
        Command::Create { name } => {
            let collection = service.create_collection(&name)?;
            println!("Created collection '{}'", collection.name);
        }
        Command::Import { name, file } => {
            let input = std::fs::read_to_string(&file).map_err(|e| {
                collection_import::ImportError::MalformedInput(format!(
                    "cannot read {}: {}",
                    file.display(),
                    e
                ))
            })?;
            let summary = service.import_csv(&name, &input).await?;
            print_summary(&summary);
        }
        Command::Show { name, json } => {
            let view = service.get_collection(&name)?;
            if json {
                match serde_json::to_string_pretty(&view) {
                    Ok(text) => println!("{}", text),
                    Err(e) => log::error!("Failed to serialize collection: {}", e),
                }
            } else {
                println!("{} ({})", view.collection.name, view.collection.created_at);
                for card in &view.cards {
                    println!(
                        "{:>4} x {} [{} {}] {} @ {}",
                        card.quantity,
                        card.card_name,
                        card.set_code.to_uppercase(),
                        card.collector_number,
                        card.finish,
                        card.price
                    );
                }
                println!(
                    "{} cards, total value {}",
                    view.totals.card_count, view.totals.total_value
                );
            }
        }
        Command::List => {
            for view in service.get_all_collections()? {
                println!(
                    "{}\t{}\t{} cards\t{}",
                    view.collection.name,
                    view.collection.created_at,
                    view.totals.card_count,
                    view.totals.total_value
                );
            }
        }
        Command::Clear { name } => {
            let removed = service.clear_collection(&name)?;
            println!("Removed {} cards from '{}'", removed, name);
        }
        Command::Delete { name } => {
            service.delete_collection(&name)?;
            println!("Deleted collection '{}'", name);
        }
    }
    Ok(())
}

fn print_summary(summary: &ImportSummary) {
    let report = &summary.report;
    println!(
        "Imported {} entries ({} cards, value {}) into '{}'",
        summary.stored_cards,
        summary.totals.card_count,
        summary.totals.total_value,
        summary.collection.name
    );
    for row in &report.malformed {
        println!("  malformed: {}", row);
    }
    for row in &report.unresolved {
        println!("  unmatched (x{}): {}", row.quantity, row.error);
    }
    for row in &report.finish_mismatches {
        println!("  wrong finish (x{}): {}", row.quantity, row.error);
    }
    println!(
        "Error count: {} ({} cards unmatched, {} with unavailable finish)",
        report.error_count(),
        report.unmatched_quantity(),
        report.mismatch_quantity()
    );
}
