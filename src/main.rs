mod api;
mod db;
mod error;
mod ingest;
mod loader;
mod parser;
mod reconcile;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use parser::StoreKind;
use settings::Settings;

#[derive(Parser)]
#[command(name = "shop_ingest", about = "Load crawled web shop pages into SQLite and serve them")]
struct Cli {
    /// SQLite database path (overrides configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Parse one crawl dump and load it
    Ingest {
        /// Which store's extraction rules to apply
        #[arg(short, long, value_enum)]
        store: StoreKind,
        /// Line-delimited JSON crawl dump
        file: PathBuf,
    },
    /// Ingest every input listed in the configuration, in order
    IngestAll,
    /// Serve the read-only query API
    Serve {
        /// Listen address (default from configuration)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Show row counts and recent ingest runs
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    let db_path = cli.db.unwrap_or_else(|| settings.database.clone());

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            println!("Schema ready in {}", db_path.display());
            Ok(())
        }
        Commands::Ingest { store, file } => {
            let mut conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            println!("Ingesting {} as {}...", file.display(), store);
            let stats = ingest::ingest_file(&mut conn, &file, store)?;
            stats.print();
            Ok(())
        }
        Commands::IngestAll => {
            if settings.inputs.is_empty() {
                println!("No inputs configured. Add [[inputs]] entries to shop_ingest.toml.");
                return Ok(());
            }
            let mut conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            for input in &settings.inputs {
                println!("Ingesting {} as {}...", input.path.display(), input.store);
                let stats = ingest::ingest_file(&mut conn, &input.path, input.store)?;
                stats.print();
            }
            Ok(())
        }
        Commands::Serve { bind } => {
            let conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            api::serve(conn, &bind).await
        }
        Commands::Stats => {
            let conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Stores:     {}", s.stores);
            println!("Brands:     {}", s.brands);
            println!("Categories: {}", s.categories);
            println!("Products:   {}", s.products);

            let runs = db::fetch_recent_runs(&conn, 10)?;
            if !runs.is_empty() {
                println!("\n--- Recent runs ---");
                for r in &runs {
                    println!(
                        "{:>4} | {:<8} | {:<25} | {:<25} | {:>6} saved | {:>6} skipped | {}",
                        r.id,
                        r.store,
                        r.started_at,
                        r.finished_at.as_deref().unwrap_or("(unfinished)"),
                        r.inserted,
                        r.skipped,
                        r.source,
                    );
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
