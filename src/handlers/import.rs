//! Import handlers: sheet preview, field listing, and the import run itself

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use base64::prelude::{Engine, BASE64_STANDARD};
use futures::StreamExt;
use tracing::{error, info};
use uuid::Uuid;

use crate::services::pipeline::{self, ImportError};
use crate::services::schema;
use crate::services::sheet::{preview_rows, read_workbook};
use crate::services::store::ImportStore;
use crate::types::{
    ErrorResponse, FieldsRequest, FieldsResponse, PreviewRequest, Request, RunImportRequest,
    SheetPreviewResponse, SuccessResponse,
};

const DEFAULT_PREVIEW_LIMIT: usize = 10;

/// Handle taqsit.import.preview requests
pub async fn handle_preview(client: Client, mut subscriber: Subscriber) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        let reply = match msg.reply {
            Some(ref r) => r.clone(),
            None => continue,
        };

        let request: Request<PreviewRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse preview request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match build_preview(&request.payload) {
            Ok(response) => {
                let success = SuccessResponse::new(request.id, response);
                let _ = client.publish(reply, serde_json::to_vec(&success)?.into()).await;
            }
            Err(e) => {
                error!("Preview failed: {}", e);
                let error = ErrorResponse::new(request.id, "PREVIEW_ERROR", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}

fn build_preview(request: &PreviewRequest) -> Result<SheetPreviewResponse, ImportError> {
    let bytes = BASE64_STANDARD
        .decode(&request.file_content)
        .map_err(|_| ImportError::InvalidPayload)?;
    let workbook = read_workbook(&bytes)?;
    let sheet = workbook.sheet(request.sheet_name.as_deref())?;
    let limit = request.limit.unwrap_or(DEFAULT_PREVIEW_LIMIT);
    Ok(SheetPreviewResponse {
        sheet_names: workbook.sheet_names(),
        sheet_name: sheet.name.clone(),
        headers: sheet.headers.clone(),
        rows: preview_rows(sheet, limit, request.blank_cells),
        total_rows: sheet.rows.len(),
    })
}

/// Handle taqsit.import.fields requests
pub async fn handle_fields(client: Client, mut subscriber: Subscriber) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        let reply = match msg.reply {
            Some(ref r) => r.clone(),
            None => continue,
        };

        let request: Request<FieldsRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse fields request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let response = FieldsResponse {
            target: request.payload.target,
            fields: schema::descriptors(request.payload.target),
        };
        let success = SuccessResponse::new(request.id, response);
        let _ = client.publish(reply, serde_json::to_vec(&success)?.into()).await;
    }

    Ok(())
}

/// Handle taqsit.import.run requests
pub async fn handle_run(
    client: Client,
    mut subscriber: Subscriber,
    store: Arc<dyn ImportStore>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        let reply = match msg.reply {
            Some(ref r) => r.clone(),
            None => continue,
        };

        let request: Request<RunImportRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse import run request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        info!(
            table = request.payload.target.as_str(),
            file = request.payload.file_name.as_deref().unwrap_or("-"),
            "Import run requested"
        );

        match pipeline::run_import(store.as_ref(), &request.payload).await {
            Ok(result) => {
                let success = SuccessResponse::new(request.id, result);
                let _ = client.publish(reply, serde_json::to_vec(&success)?.into()).await;
            }
            Err(e) => {
                error!("Import run failed: {}", e);
                let error = ErrorResponse::new(request.id, import_error_code(&e), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}

fn import_error_code(error: &ImportError) -> &'static str {
    match error {
        ImportError::InvalidPayload => "INVALID_PAYLOAD",
        ImportError::Sheet(_) => "SHEET_ERROR",
        ImportError::IncompleteMapping(_) => "INCOMPLETE_MAPPING",
        ImportError::DependencyLookup(_) => "LOOKUP_ERROR",
    }
}
