//! Fraud Scoring Serving API
//!
//! HTTP front door for the canary/shadow inference core.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SERVING API (Axum)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  /predict ──▶ validate ──▶ InferenceService ──▶ JSON result │
//! │                                │                            │
//! │          ┌─────────────────────┼───────────────────┐        │
//! │          ▼                     ▼                   ▼        │
//! │   ┌─────────────┐   ┌──────────────────┐   ┌─────────────┐  │
//! │   │ Feast store │   │ LRU model cache  │   │ Shadow task │  │
//! │   └─────────────┘   └──────────────────┘   └─────────────┘  │
//! │                                                             │
//! │  /metrics ◀── Prometheus registry ◀── rollback watchdog     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod models;
mod handlers;
mod error;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inference_core::{
    ArtifactLoader, CanarySelector, Collaborators, FeastConfig, FeastHttpStore, InferenceMetrics,
    InferenceService, LruModelCache, RollbackWatchdog, ServiceSettings, ShadowInvoker,
    ShadowRunner, StoreFeatureLookup,
};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "serving_api=debug,inference_core=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        "Serving API starting ({}, inference-core {})...",
        config.environment,
        inference_core::constants::CORE_VERSION
    );
    tracing::info!(
        "Models: baseline={} canary={} split={} shadow={}",
        config.baseline_model_uri,
        config.canary_model_uri,
        config.canary_split,
        config.shadow_enabled
    );

    let (service, watchdog) = build_service(&config)?;

    if let Some(watchdog) = watchdog {
        tracing::info!(
            "Rollback watchdog armed: >{} canary exceptions per {}s",
            config.rollback_threshold,
            config.rollback_interval_secs
        );
        watchdog.spawn();
    }

    let app = create_router(AppState { service });

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InferenceService>,
}

/// Wire the inference core from configuration
fn build_service(config: &config::Config) -> anyhow::Result<(Arc<InferenceService>, Option<RollbackWatchdog>)> {
    let metrics = Arc::new(InferenceMetrics::new().context("failed to register metrics")?);

    let store = FeastHttpStore::new(FeastConfig {
        server_url: config.feast_server_url.clone(),
        timeout_ms: config.feature_timeout_ms,
    })
    .context("failed to build feature store client")?;
    let features = Arc::new(StoreFeatureLookup::new(Arc::new(store), metrics.clone()));

    let selector = Arc::new(CanarySelector::new(config.canary_split, config.canary_seed)?);

    let loader = Arc::new(ArtifactLoader::new(&config.model_registry_dir));
    let models = Arc::new(LruModelCache::new(loader.clone(), config.model_cache_capacity)?);

    // Private instance: shadow runs never contend with live sessions
    let shadow: Option<Arc<dyn ShadowRunner>> = if config.shadow_enabled {
        let invoker = ShadowInvoker::load(
            loader.as_ref(),
            &config.shadow_model_uri,
            metrics.clone(),
            config.shadow_max_in_flight,
        )?;
        Some(Arc::new(invoker))
    } else {
        None
    };

    let collaborators = Collaborators {
        features,
        selector: selector.clone(),
        models,
        shadow,
        metrics: metrics.clone(),
    };
    let settings = ServiceSettings {
        baseline_uri: config.baseline_model_uri.clone(),
        canary_uri: config.canary_model_uri.clone(),
        model_version: config.model_version.clone(),
    };
    let service = Arc::new(InferenceService::new(collaborators, settings)?);

    let watchdog = (config.rollback_threshold > 0 && config.canary_split > 0.0).then(|| {
        RollbackWatchdog::new(
            selector,
            metrics,
            config.rollback_threshold,
            Duration::from_secs(config.rollback_interval_secs),
        )
    });

    Ok((service, watchdog))
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/metrics", get(handlers::metrics::export))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
        )
        // CORS stays outermost; applied as a separate Router layer so its
        // inner body is axum's `Body` (tower-http CORS requires `ResBody: Default`).
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
