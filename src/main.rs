use std::fmt::Display;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aggregate_store::config::StoreConfig;
use aggregate_store::db::Database;
use aggregate_store::demo::{self, Snapshot};
use aggregate_store::events::Interceptors;
use aggregate_store::naming::NamingStrategy;

#[derive(Parser)]
#[command(name = "aggregates")]
#[command(about = "Aggregate persistence walkthroughs over an embedded SQLite store")]
struct Cli {
    /// SQLite file to use instead of the configured one
    #[arg(long, global = true, conflicts_with = "memory")]
    database: Option<PathBuf>,

    /// Use a throwaway in-memory database
    #[arg(long, global = true)]
    memory: bool,

    /// Print snapshots as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a set with a manual, edit the manual, then replace it
    Lego,
    /// Save, update and delete categories with age groups and timestamps
    Categories,
    /// Same as `categories` without the timestamping hook
    SingleClass,
    /// Print everything currently stored
    List,
}

/// Logs go to stderr so stdout carries only the snapshots.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "aggregate_store=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(cli: &Cli, config: &StoreConfig) -> anyhow::Result<Database> {
    let db = if cli.memory {
        Database::open_memory()?
    } else if let Some(path) = cli.database.clone().or_else(|| config.database_path.clone()) {
        Database::open(path)?
    } else {
        Database::open_default()?
    };
    Ok(db.with_naming(NamingStrategy::from(&config.naming)))
}

fn print_snapshots<T: Display + Serialize>(
    snapshots: &[Snapshot<T>],
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshots)?);
    } else {
        for snapshot in snapshots {
            println!("{}", snapshot);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = StoreConfig::load();
    let db = open_database(&cli, &config)?;

    match cli.command.as_ref().unwrap_or(&Commands::Lego) {
        Commands::Lego => {
            db.migrate()?;
            print_snapshots(&demo::lego_sets(&db)?, cli.json)?;
        }
        Commands::Categories => {
            db.migrate()?;
            print_snapshots(&demo::categories(&db)?, cli.json)?;
        }
        Commands::SingleClass => {
            let db = db.with_interceptors(Interceptors::default());
            db.migrate()?;
            print_snapshots(&demo::single_class(&db)?, cli.json)?;
        }
        Commands::List => {
            db.migrate()?;
            let listing = demo::listing(&db)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                println!("{}", listing.lego_sets);
                println!("{}", listing.categories);
            }
        }
    }

    Ok(())
}
