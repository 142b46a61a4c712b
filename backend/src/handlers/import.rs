//! HTTP handler for the one-time legacy import

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::services::migrate::{ImportSummary, LegacyImportInput, MigrationService};
use crate::AppState;

/// Import a client-local legacy export into the store
pub async fn import_legacy(
    State(state): State<AppState>,
    Json(input): Json<LegacyImportInput>,
) -> AppResult<(StatusCode, Json<ImportSummary>)> {
    let service = MigrationService::new(state.items.clone(), state.batches.clone());
    let summary = service.import(input).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}
