//! Admin dashboard endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::annotations::{Annotation, AnnotationFilter, AnnotationStats, StorageBackend};
use crate::error::Result;
use crate::state::AppState;
use crate::visitor::AdminAuth;

/// Create the admin router
pub fn router() -> Router<AppState> {
    Router::new().route("/annotations", get(dashboard))
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub annotations: Vec<Annotation>,
    pub stats: AnnotationStats,
    pub backend: StorageBackend,
}

/// Every annotation, including removed ones, with status counts
async fn dashboard(_admin: AdminAuth, State(state): State<AppState>) -> Result<Json<DashboardResponse>> {
    let service = state.annotations();
    let annotations = service.list(&AnnotationFilter::default()).await?;
    let stats = service.stats().await?;

    Ok(Json(DashboardResponse {
        annotations,
        stats,
        backend: service.backend(),
    }))
}
