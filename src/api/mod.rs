use axum::routing::post;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::error::AppError;
use crate::services::{SyncService, SyncStats};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sync", post(sync_now))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn sync_now(State(state): State<AppState>) -> Result<Json<SyncStats>, AppError> {
    let service = SyncService::new(
        state.canvas.clone(),
        state.notion.clone(),
        state.assignee.clone(),
    );
    let stats = service.sync_all().await?;
    Ok(Json(stats))
}
