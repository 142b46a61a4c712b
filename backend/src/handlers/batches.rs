//! HTTP handlers for batch endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::BatchRecord;
use crate::services::batch::{
    BatchInput, BatchService, DeleteBatchOutcome, MaterializeOutcome, UpdateBatchInput,
};
use crate::services::pricing::BatchPricing;
use crate::AppState;

fn batch_service(state: &AppState) -> BatchService {
    BatchService::new(
        state.items.clone(),
        state.batches.clone(),
        state.cache.clone(),
    )
}

/// Price a batch without persisting anything
pub async fn preview_batch(
    State(state): State<AppState>,
    Json(input): Json<BatchInput>,
) -> AppResult<Json<BatchPricing>> {
    let pricing = batch_service(&state).preview(&input)?;
    Ok(Json(pricing))
}

/// Send a priced batch to stock
pub async fn materialize_batch(
    State(state): State<AppState>,
    Json(input): Json<BatchInput>,
) -> AppResult<(StatusCode, Json<MaterializeOutcome>)> {
    let outcome = batch_service(&state).materialize(input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// List batch history, newest first
pub async fn list_batches(State(state): State<AppState>) -> AppResult<Json<Vec<BatchRecord>>> {
    let batches = batch_service(&state).list().await?;
    Ok(Json(batches))
}

/// Edit a batch record's note
pub async fn update_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBatchInput>,
) -> AppResult<Json<BatchRecord>> {
    let batch = batch_service(&state).update(id, input).await?;
    Ok(Json(batch))
}

/// Delete a batch, cascading to the items it produced
pub async fn delete_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteBatchOutcome>> {
    let outcome = batch_service(&state).delete(id).await?;
    Ok(Json(outcome))
}
