//! Route definitions for the ReStock API

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Item management
        .nest("/items", item_routes())
        // Batch management
        .nest("/batches", batch_routes())
        // Reporting
        .nest("/reports", report_routes())
        // One-time legacy import
        .route("/import/legacy", post(handlers::import_legacy))
}

/// Item routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/:id",
            put(handlers::update_item).delete(handlers::delete_item),
        )
        .route("/:id/sell", post(handlers::sell_item))
        .route("/:id/return", post(handlers::return_item))
}

/// Batch routes
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_batches).post(handlers::materialize_batch),
        )
        .route("/preview", post(handlers::preview_batch))
        .route(
            "/:id",
            put(handlers::update_batch).delete(handlers::delete_batch),
        )
}

/// Reporting routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/items.csv", get(handlers::export_items_csv))
}
