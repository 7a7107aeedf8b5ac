//! Shadow Evaluation
//!
//! Replays the live scoring row against a reference model on a detached
//! task. Nothing flows back to the caller: failures and panics are logged,
//! counted and dropped. No ordering or completion guarantee, including at
//! shutdown.
//!
//! The shadow scores on its own model instance, never a handle shared with
//! live traffic, and at most `max_in_flight` runs are outstanding. Beyond
//! that, submissions are dropped and counted as `outcome="dropped"`.

use std::sync::Arc;

use tokio::sync::Semaphore;

use super::features::TabularRow;
use super::metrics::{InferenceMetrics, SHADOW_DROPPED, SHADOW_ERROR, SHADOW_OK};
use super::model::{ModelHandle, ModelLoadError, ModelLoader};
use crate::constants::DEFAULT_SHADOW_MAX_IN_FLIGHT;

/// Fire-and-forget secondary prediction
pub trait ShadowRunner: Send + Sync {
    fn submit(&self, row: TabularRow);
}

pub struct ShadowInvoker {
    handle: Arc<ModelHandle>,
    metrics: Arc<InferenceMetrics>,
    permits: Arc<Semaphore>,
}

impl ShadowInvoker {
    pub fn new(handle: Arc<ModelHandle>, metrics: Arc<InferenceMetrics>) -> Self {
        Self::with_max_in_flight(handle, metrics, DEFAULT_SHADOW_MAX_IN_FLIGHT)
    }

    pub fn with_max_in_flight(
        handle: Arc<ModelHandle>,
        metrics: Arc<InferenceMetrics>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            handle,
            metrics,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// Load a private instance of `uri`, bypassing the live handle cache
    pub fn load(
        loader: &dyn ModelLoader,
        uri: &str,
        metrics: Arc<InferenceMetrics>,
        max_in_flight: usize,
    ) -> Result<Self, ModelLoadError> {
        let handle = loader.load(uri).map_err(|source| ModelLoadError {
            uri: uri.to_string(),
            source,
        })?;
        log::info!("Shadow model loaded from {} (max {} in flight)", uri, max_in_flight);

        Ok(Self::with_max_in_flight(Arc::new(handle), metrics, max_in_flight))
    }

    pub fn model_uri(&self) -> &str {
        self.handle.uri()
    }
}

impl ShadowRunner for ShadowInvoker {
    fn submit(&self, row: TabularRow) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                log::warn!("No async runtime, shadow prediction dropped");
                return;
            }
        };

        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                log::debug!("Shadow pool saturated, prediction dropped");
                self.metrics.record_shadow(SHADOW_DROPPED);
                return;
            }
        };

        let handle = self.handle.clone();
        let metrics = self.metrics.clone();

        runtime.spawn(async move {
            let uri = handle.uri().to_string();
            let outcome = tokio::task::spawn_blocking(move || handle.score(&row)).await;
            drop(permit);

            match outcome {
                Ok(Ok(score)) => {
                    log::debug!("Shadow model {} scored {:.4}", uri, score);
                    metrics.record_shadow(SHADOW_OK);
                }
                Ok(Err(e)) => {
                    log::warn!("Shadow prediction failed on {}: {}", uri, e);
                    metrics.record_shadow(SHADOW_ERROR);
                }
                Err(e) => {
                    log::warn!("Shadow prediction aborted on {}: {}", uri, e);
                    metrics.record_shadow(SHADOW_ERROR);
                }
            }
        });
    }
}
