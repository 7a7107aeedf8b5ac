//! Prometheus exposition handler

use axum::{extract::State, http::header, response::IntoResponse};

use crate::AppState;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

pub async fn export(State(state): State<AppState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT_FORMAT)], state.service.metrics().render())
}
