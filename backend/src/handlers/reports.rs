//! HTTP handlers for reporting endpoints

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::error::AppResult;
use crate::services::reporting::{DashboardMetrics, ReportingService};
use crate::AppState;

/// Dashboard metrics, recomputed from the full item set
pub async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardMetrics>> {
    let service = ReportingService::new(state.items.clone());
    let metrics = service.dashboard().await?;
    Ok(Json(metrics))
}

/// Full item set as CSV
pub async fn export_items_csv(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.items.clone());
    let csv = service.export_items_csv().await?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"items.csv\"",
            ),
        ],
        csv,
    ))
}
