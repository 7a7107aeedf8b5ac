//! Prediction handler

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use inference_core::{InferenceRequest, InferenceResult};

use crate::models::PredictRequest;
use crate::{AppResult, AppState};

const TRACEPARENT: &str = "traceparent";

/// Trace id from a W3C `traceparent` header, else a fresh one
fn trace_id(headers: &HeaderMap) -> String {
    headers
        .get(TRACEPARENT)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split('-').nth(1))
        .filter(|id| id.len() == 32 && id.chars().all(|c| c.is_ascii_hexdigit()))
        .map(|id| id.to_ascii_lowercase())
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
}

pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<InferenceResult>> {
    let Json(req) = body?;
    req.validate()?;

    let trace_id = trace_id(&headers);
    let request = InferenceRequest::try_from(req)?;

    let result = state.service.predict(&request).await?;

    tracing::info!(
        trace_id = %trace_id,
        user_id = %result.user_id,
        variant = %result.canary_variant,
        score = result.score,
        "Prediction served"
    );

    Ok(Json(result.with_trace_id(trace_id)))
}
