//! Inference Orchestrator
//!
//! One request, start to finish:
//!
//! ```text
//! event ─▶ FeatureLookup ─▶ VariantSelector ─▶ ModelCache(variant uri, reload on blocking pool)
//!                                                   │
//!            requests_total{variant} ◀──────────────┤
//!            latency{variant} ◀── score (blocking pool)
//!            exceptions{variant} ◀── on error ──▶ Err(Scoring)
//!                                                   │
//!            Decision::from_score ─▶ ShadowRunner::submit (detached)
//!                                                   │
//!                                            InferenceResult
//! ```
//!
//! Collaborators are injected as trait objects; tests substitute them by
//! construction.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::canary::{Variant, VariantSelector};
use super::config::{ConfigError, ServiceSettings};
use super::events::InferenceRequest;
use super::features::{FeatureLookup, TabularRow};
use super::metrics::InferenceMetrics;
use super::model::{Decision, InferenceError, ModelCache, ModelHandle, ModelLoadError};
use super::shadow::ShadowRunner;


// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Terminal artifact of one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub user_id: String,
    pub model_version: String,
    pub score: f64,
    pub decision: Decision,
    pub canary_variant: Variant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl InferenceResult {
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

/// Liveness probe body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error("scoring failed on {variant} model")]
    Scoring {
        variant: Variant,
        #[source]
        source: InferenceError,
    },
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
}

/// Everything the service delegates to
#[derive(Clone)]
pub struct Collaborators {
    pub features: Arc<dyn FeatureLookup>,
    pub selector: Arc<dyn VariantSelector>,
    pub models: Arc<dyn ModelCache>,
    /// `None` disables shadow evaluation
    pub shadow: Option<Arc<dyn ShadowRunner>>,
    pub metrics: Arc<InferenceMetrics>,
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct InferenceService {
    features: Arc<dyn FeatureLookup>,
    selector: Arc<dyn VariantSelector>,
    models: Arc<dyn ModelCache>,
    shadow: Option<Arc<dyn ShadowRunner>>,
    metrics: Arc<InferenceMetrics>,
    settings: ServiceSettings,
}

impl InferenceService {
    /// Warms both variant handles; a missing artifact fails startup, as does
    /// a cache too small to keep both resident
    pub fn new(collaborators: Collaborators, settings: ServiceSettings) -> Result<Self, StartupError> {
        if let Some(capacity) = collaborators.models.max_entries() {
            settings.check_cache_capacity(capacity)?;
        }

        collaborators.models.load(&settings.baseline_uri)?;
        collaborators.models.load(&settings.canary_uri)?;

        log::info!(
            "Inference service ready: baseline={} canary={} shadow={}",
            settings.baseline_uri,
            settings.canary_uri,
            if collaborators.shadow.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            features: collaborators.features,
            selector: collaborators.selector,
            models: collaborators.models,
            shadow: collaborators.shadow,
            metrics: collaborators.metrics,
            settings,
        })
    }

    fn model_uri(&self, variant: Variant) -> &str {
        match variant {
            Variant::Baseline => &self.settings.baseline_uri,
            Variant::Canary => &self.settings.canary_uri,
        }
    }

    /// Cached handle, or a reload on the blocking pool after eviction
    async fn resolve_model(&self, variant: Variant) -> Result<Arc<ModelHandle>, ModelLoadError> {
        let uri = self.model_uri(variant);
        if let Some(handle) = self.models.peek(uri) {
            return Ok(handle);
        }

        log::warn!("{} model {} not resident, reloading", variant, uri);
        let models = self.models.clone();
        let owned_uri = uri.to_string();
        match tokio::task::spawn_blocking(move || models.load(&owned_uri)).await {
            Ok(loaded) => loaded,
            Err(e) => Err(ModelLoadError {
                uri: uri.to_string(),
                source: InferenceError::Runtime(format!("model load task aborted: {}", e)),
            }),
        }
    }

    pub async fn predict(&self, request: &InferenceRequest) -> Result<InferenceResult, PredictError> {
        let features = self.features.fetch(&request.event).await;
        let row = TabularRow::new(&features, &request.event);

        let decision = self.selector.choose();
        let variant = decision.variant;
        let model = self.resolve_model(variant).await?;

        self.metrics.record_request(variant);

        let started = Instant::now();
        let scoring_row = row.clone();
        let scored = match tokio::task::spawn_blocking(move || model.score(&scoring_row)).await {
            Ok(scored) => scored,
            Err(e) => Err(InferenceError::Prediction(format!("scoring task aborted: {}", e))),
        };
        self.metrics.observe_latency(variant, started.elapsed().as_secs_f64());

        let score = match scored {
            Ok(score) => score,
            Err(source) => {
                self.metrics.record_exception(variant);
                log::error!("Scoring failed on {} model for user {}: {}", variant, request.user_id, source);
                return Err(PredictError::Scoring { variant, source });
            }
        };

        if let Some(shadow) = &self.shadow {
            shadow.submit(row);
        }

        Ok(InferenceResult {
            user_id: request.user_id.clone(),
            model_version: self.settings.model_version.clone(),
            score,
            decision: Decision::from_score(score),
            canary_variant: variant,
            trace_id: None,
        })
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus { status: "ok" }
    }

    pub fn metrics(&self) -> &Arc<InferenceMetrics> {
        &self.metrics
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn shadow_enabled(&self) -> bool {
        self.shadow.is_some()
    }
}
