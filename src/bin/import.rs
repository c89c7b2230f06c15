//! Offline import tool: normalize a congress workbook into the JSON snapshot
//! or upsert it into the SQLite database.
//!
//! Usage:
//!   medicalmap-import <workbook.xlsx> [--snapshot [out.json] | --db]
//!
//! Without a mode flag the configured `data.backend` decides the output.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite};
use tracing::{error, info};

use medicalmap::{config, db, ingest};

enum Mode {
    Snapshot(Option<PathBuf>),
    Db,
}

fn usage() -> ! {
    eprintln!("Usage: medicalmap-import <workbook.xlsx> [--snapshot [out.json] | --db]");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut input: Option<PathBuf> = None;
    let mut mode: Option<Mode> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--snapshot" => {
                let out = args.next().map(PathBuf::from);
                mode = Some(Mode::Snapshot(out));
            }
            "--db" => mode = Some(Mode::Db),
            "--help" | "-h" => usage(),
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            _ => usage(),
        }
    }
    let Some(input) = input else { usage() };

    match run(&input, mode).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Import failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(input: &Path, mode: Option<Mode>) -> anyhow::Result<()> {
    let cfg = config::load()?;

    let mode = mode.unwrap_or_else(|| match cfg.data.backend.as_str() {
        "sqlite" => Mode::Db,
        _ => Mode::Snapshot(None),
    });

    info!("Reading: {}", input.display());
    let rows = ingest::xlsx::read_rows(input, &cfg.import.sheet_name)?;
    info!("Found {} rows in sheet \"{}\"", rows.len(), cfg.import.sheet_name);

    match mode {
        Mode::Snapshot(out) => {
            let out = out.unwrap_or_else(|| PathBuf::from(&cfg.data.snapshot_path));
            let (records, report) = ingest::rows_to_snapshot(&rows, &cfg.import.fallback_region);
            ingest::write_snapshot(&out, &records)
                .map_err(|e| anyhow::anyhow!("failed to write snapshot: {}", e))?;
            info!("Written: {}", out.display());
            info!("Records: {}, Skipped: {}", report.inserted, report.skipped);
        }
        Mode::Db => {
            let db_url = &cfg.database.url;
            config::ensure_sqlite_parent_dir(db_url)?;
            if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
                info!("Creating SQLite database at {}", db_url);
                Sqlite::create_database(db_url).await?;
            }
            let pool = SqlitePoolOptions::new().max_connections(4).connect(db_url).await?;
            db::init_db(&pool).await?;

            let report = ingest::import_to_db(&pool, &rows, &cfg.import.fallback_region)
                .await
                .map_err(|e| anyhow::anyhow!("import failed: {}", e))?;
            info!(
                "Done. Inserted: {}, Updated: {}, Skipped: {}",
                report.inserted, report.updated, report.skipped
            );
        }
    }

    Ok(())
}
