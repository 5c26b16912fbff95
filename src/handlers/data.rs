//! Data maintenance handlers

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use sqlx::PgPool;
use tracing::{error, warn};
use uuid::Uuid;

use crate::db::queries;
use crate::types::{
    DeleteDataRequest, DeleteDataResponse, ErrorResponse, ImportTarget, Request, SuccessResponse,
};

/// Handle taqsit.data.delete requests
pub async fn handle_delete(client: Client, mut subscriber: Subscriber, pool: PgPool) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        let reply = match msg.reply {
            Some(ref r) => r.clone(),
            None => continue,
        };

        let request: Request<DeleteDataRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse data delete request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        warn!(
            table = request.payload.target.as_str(),
            hours = ?request.payload.newer_than_hours,
            "Deleting imported data"
        );

        match delete_target(&pool, &request.payload).await {
            Ok(deleted) => {
                let response = DeleteDataResponse {
                    target: request.payload.target,
                    deleted,
                };
                let success = SuccessResponse::new(request.id, response);
                let _ = client.publish(reply, serde_json::to_vec(&success)?.into()).await;
            }
            Err(e) => {
                error!("Data delete failed: {}", e);
                let error = ErrorResponse::new(request.id, "DELETE_ERROR", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}

/// Deletes the target's rows, clearing dependents first so foreign keys
/// do not block the delete. Returns the count from the target table only.
async fn delete_target(pool: &PgPool, request: &DeleteDataRequest) -> Result<u64> {
    let hours = request.newer_than_hours;
    match request.target {
        ImportTarget::Payment => queries::payment::delete_imported(pool, hours).await,
        ImportTarget::Transaction => {
            queries::payment::delete_imported(pool, hours).await?;
            queries::transaction::delete_imported(pool, hours).await
        }
        ImportTarget::Customer => {
            queries::payment::delete_imported(pool, hours).await?;
            queries::transaction::delete_imported(pool, hours).await?;
            queries::customer::delete_imported(pool, hours).await
        }
    }
}
