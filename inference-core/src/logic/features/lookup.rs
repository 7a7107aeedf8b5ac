//! Feature Lookup - store-backed features with raw-event fallback
//!
//! `fetch` never fails for a valid event: any store problem (error, timeout,
//! unknown user, null value) degrades to the event's own fields.

use std::sync::Arc;

use async_trait::async_trait;

use super::store::{FeatureMap, FeatureStore};
use super::vector::FeatureVector;
use crate::constants::ONLINE_FEATURES;
use crate::logic::events::Event;
use crate::logic::metrics::InferenceMetrics;

/// Resolves a feature vector for an incoming event
#[async_trait]
pub trait FeatureLookup: Send + Sync {
    async fn fetch(&self, event: &Event) -> FeatureVector;
}

/// Lookup backed by an online feature store
pub struct StoreFeatureLookup {
    store: Arc<dyn FeatureStore>,
    metrics: Arc<InferenceMetrics>,
}

impl StoreFeatureLookup {
    pub fn new(store: Arc<dyn FeatureStore>, metrics: Arc<InferenceMetrics>) -> Self {
        Self { store, metrics }
    }

    fn fallback(&self, event: &Event, reason: &str) -> FeatureVector {
        log::warn!("Falling back to raw features for user {} due to: {}", event.user_id, reason);
        self.metrics.record_feature_fallback();
        FeatureVector::from_event(event, Some(event.transaction_amount))
    }
}

fn amount_statistic(features: &FeatureMap) -> Option<f64> {
    features
        .get("transaction_amount")
        .and_then(|values| values.first().copied().flatten())
        .filter(|v| v.is_finite())
}

#[async_trait]
impl FeatureLookup for StoreFeatureLookup {
    async fn fetch(&self, event: &Event) -> FeatureVector {
        match self.store.get_features(&event.user_id, ONLINE_FEATURES).await {
            Ok(features) => match amount_statistic(&features) {
                Some(zscore) => FeatureVector::from_event(event, Some(zscore)),
                None => self.fallback(event, "no transaction_amount for entity"),
            },
            Err(e) => self.fallback(event, &e.to_string()),
        }
    }
}

/// Lookup that never consults a store
pub struct RawEventLookup;

#[async_trait]
impl FeatureLookup for RawEventLookup {
    async fn fetch(&self, event: &Event) -> FeatureVector {
        FeatureVector::from_event(event, Some(event.transaction_amount))
    }
}
