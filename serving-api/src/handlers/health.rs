//! Health check handler

use axum::{extract::State, Json};

use inference_core::HealthStatus;

use crate::AppState;

pub async fn check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.service.health())
}
