//! Feature Store Client
//!
//! Narrow interface over the online feature store plus an HTTP client for a
//! Feast feature server (`POST /get-online-features`).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::FEATURE_VIEW;

/// Feature name → values (one per requested entity row)
pub type FeatureMap = HashMap<String, Vec<Option<f64>>>;

#[derive(Debug, Error)]
pub enum FeatureStoreError {
    #[error("feature server request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feature server returned status {0}")]
    Status(u16),

    #[error("malformed feature server response: {0}")]
    Malformed(String),
}

/// Online feature store
#[async_trait]
pub trait FeatureStore: Send + Sync {
    async fn get_features(
        &self,
        user_id: &str,
        feature_names: &[&str],
    ) -> Result<FeatureMap, FeatureStoreError>;
}

// ============================================================================
// FEAST HTTP CLIENT
// ============================================================================

/// Feature server configuration
#[derive(Debug, Clone)]
pub struct FeastConfig {
    pub server_url: String,
    pub timeout_ms: u64,
}

impl Default for FeastConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:6566".to_string(),
            timeout_ms: crate::constants::DEFAULT_FEATURE_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Serialize)]
struct OnlineFeaturesRequest {
    features: Vec<String>,
    entities: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct OnlineFeaturesResponse {
    metadata: ResponseMetadata,
    results: Vec<FeatureColumn>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    feature_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FeatureColumn {
    values: Vec<serde_json::Value>,
}

/// Feast feature server client
pub struct FeastHttpStore {
    config: FeastConfig,
    http_client: reqwest::Client,
}

impl FeastHttpStore {
    pub fn new(config: FeastConfig) -> Result<Self, FeatureStoreError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { config, http_client })
    }

    fn endpoint(&self) -> String {
        format!("{}/get-online-features", self.config.server_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl FeatureStore for FeastHttpStore {
    async fn get_features(
        &self,
        user_id: &str,
        feature_names: &[&str],
    ) -> Result<FeatureMap, FeatureStoreError> {
        let request = OnlineFeaturesRequest {
            features: feature_names
                .iter()
                .map(|name| format!("{}:{}", FEATURE_VIEW, name))
                .collect(),
            entities: HashMap::from([("user_id".to_string(), vec![user_id.to_string()])]),
        };

        let response = self.http_client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeatureStoreError::Status(response.status().as_u16()));
        }

        let body: OnlineFeaturesResponse = response.json().await?;
        parse_online_features(body)
    }
}

/// Zip feature names with their result columns; non-numeric values become `None`
fn parse_online_features(body: OnlineFeaturesResponse) -> Result<FeatureMap, FeatureStoreError> {
    let names = body.metadata.feature_names;
    if names.len() != body.results.len() {
        return Err(FeatureStoreError::Malformed(format!(
            "{} feature names but {} result columns",
            names.len(),
            body.results.len()
        )));
    }

    Ok(names
        .into_iter()
        .zip(body.results)
        .map(|(name, column)| {
            let values = column.values.iter().map(serde_json::Value::as_f64).collect();
            (name, values)
        })
        .collect())
}
