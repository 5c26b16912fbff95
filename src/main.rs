//! Taqsit Worker - Backend service for spreadsheet imports
//!
//! This worker connects to NATS and handles import requests from the
//! back-office frontend.

mod cli;
mod config;
mod db;
mod handlers;
mod services;
mod types;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ../logs (relative to worker)
    let logs_dir = std::env::var("LOGS_DIR")
        .unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &logs_dir,
        "worker.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,taqsit_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())  // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))  // file
        .init();

    let args = Cli::parse();
    match args.command {
        Some(Command::Migrate) => run_migrate().await,
        Some(Command::Import {
            file,
            target,
            sheet,
            mappings,
        }) => run_local_import(file, target.into(), sheet, &mappings).await,
        Some(Command::Serve) | None => serve().await,
    }
}

async fn serve() -> Result<()> {
    info!("Starting Taqsit Worker...");

    // Load configuration
    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    // Connect to database
    let pool = db::create_pool(&config.database_url).await?;
    info!("Connected to PostgreSQL");

    // Run migrations
    db::run_migrations(&pool).await?;

    // Connect to NATS (supports optional NATS_USER/NATS_PASSWORD auth).
    let nats_client = match (std::env::var("NATS_USER"), std::env::var("NATS_PASSWORD")) {
        (Ok(user), Ok(password)) if !user.is_empty() => {
            async_nats::ConnectOptions::new()
                .user_and_password(user, password)
                .connect(&config.nats_url)
                .await?
        }
        _ => async_nats::connect(&config.nats_url).await?,
    };
    info!("Connected to NATS at {}", config.nats_url);

    // Start message handlers
    let handler_result = handlers::start_handlers(nats_client, pool).await;

    if let Err(e) = handler_result {
        error!("Handler error: {}", e);
        return Err(e);
    }

    Ok(())
}

async fn run_migrate() -> Result<()> {
    let config = config::Config::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    Ok(())
}

async fn run_local_import(
    file: std::path::PathBuf,
    target: types::ImportTarget,
    sheet: Option<String>,
    mapping_args: &[String],
) -> Result<()> {
    use anyhow::anyhow;

    let config = config::Config::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let mappings = cli::parse_mappings(mapping_args).map_err(|e| anyhow!(e))?;
    let bytes = std::fs::read(&file)?;
    let store = services::store::PgStore::new(pool);

    let result = services::pipeline::import_file(
        &store,
        &bytes,
        sheet.as_deref(),
        target,
        &mappings,
    )
    .await?;

    info!(
        success = result.success_count,
        failed = result.failed_rows.len(),
        "Import finished"
    );
    for failure in &result.failed_rows {
        error!(row = failure.row, errors = ?failure.errors, "Row rejected");
    }
    Ok(())
}
