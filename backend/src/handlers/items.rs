//! HTTP handlers for item endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Item;
use crate::services::lifecycle::{
    CreateItemInput, ItemService, ReturnItemInput, SaleOutcome, SellItemInput, UpdateItemInput,
};
use crate::services::reconcile::ReconcileService;
use crate::AppState;

/// List all items. While the legacy capability flag is on, a
/// reconciliation pass runs first to backfill missing batch tags;
/// its failure never fails the listing.
pub async fn list_items(State(state): State<AppState>) -> AppResult<Json<Vec<Item>>> {
    if state.config.legacy.reconcile_enabled {
        let reconciler = ReconcileService::new(
            state.items.clone(),
            state.batches.clone(),
            state.cache.clone(),
        );
        if let Err(e) = reconciler.run().await {
            tracing::warn!(error = %e, "Opportunistic reconciliation failed");
        }
    }

    let service = ItemService::new(state.items.clone(), state.cache.clone());
    let items = service.list().await?;
    Ok(Json(items))
}

/// Create an item
pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let service = ItemService::new(state.items.clone(), state.cache.clone());
    let item = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Edit an item's fields
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.items.clone(), state.cache.clone());
    let item = service.update(id, input).await?;
    Ok(Json(item))
}

/// Delete an item
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ItemService::new(state.items.clone(), state.cache.clone());
    service.delete(id).await?;
    Ok(Json(()))
}

/// Sell all or part of a stock lot
pub async fn sell_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SellItemInput>,
) -> AppResult<Json<SaleOutcome>> {
    let service = ItemService::new(state.items.clone(), state.cache.clone());
    let outcome = service.sell(id, input).await?;
    Ok(Json(outcome))
}

/// Return a sold item to stock
pub async fn return_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReturnItemInput>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.items.clone(), state.cache.clone());
    let item = service.return_to_stock(id, input).await?;
    Ok(Json(item))
}
