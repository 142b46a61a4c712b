//! ReStock backend
//!
//! A small-business resale inventory/sales tracker: items move from
//! in-stock to sold, bulk purchase batches get blended cost allocation,
//! and a reconciliation pass backfills batch tags on legacy records.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use store::{BatchStore, ItemStore, SideCache};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<dyn ItemStore>,
    pub batches: Arc<dyn BatchStore>,
    pub cache: Arc<SideCache>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "ReStock API v1.0"
}
