//! NATS message handlers

pub mod data;
pub mod import;
pub mod ping;

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use sqlx::PgPool;
use tokio::select;
use tracing::{error, info};

use crate::services::store::{ImportStore, PgStore};

/// Start all message handlers
pub async fn start_handlers(client: Client, pool: PgPool) -> Result<()> {
    info!("Starting message handlers...");

    let store: Arc<dyn ImportStore> = Arc::new(PgStore::new(pool.clone()));

    // Subscribe to all subjects
    let ping_sub = client.subscribe("taqsit.ping").await?;
    let preview_sub = client.subscribe("taqsit.import.preview").await?;
    let fields_sub = client.subscribe("taqsit.import.fields").await?;
    let run_sub = client.subscribe("taqsit.import.run").await?;
    let delete_sub = client.subscribe("taqsit.data.delete").await?;

    info!("Subscribed to NATS subjects");

    // Clone for each handler
    let client_ping = client.clone();
    let client_preview = client.clone();
    let client_fields = client.clone();
    let client_run = client.clone();
    let client_delete = client.clone();
    let pool_delete = pool.clone();

    let ping_handle = tokio::spawn(async move {
        ping::handle_ping(client_ping, ping_sub).await
    });
    let preview_handle = tokio::spawn(async move {
        import::handle_preview(client_preview, preview_sub).await
    });
    let fields_handle = tokio::spawn(async move {
        import::handle_fields(client_fields, fields_sub).await
    });
    let run_handle = tokio::spawn(async move {
        import::handle_run(client_run, run_sub, store).await
    });
    let delete_handle = tokio::spawn(async move {
        data::handle_delete(client_delete, delete_sub, pool_delete).await
    });

    info!("All handlers started");

    // If any handler finishes, something went wrong
    select! {
        result = ping_handle => {
            error!("Ping handler finished: {:?}", result);
        }
        result = preview_handle => {
            error!("Import preview handler finished: {:?}", result);
        }
        result = fields_handle => {
            error!("Import fields handler finished: {:?}", result);
        }
        result = run_handle => {
            error!("Import run handler finished: {:?}", result);
        }
        result = delete_handle => {
            error!("Data delete handler finished: {:?}", result);
        }
    }

    Ok(())
}
