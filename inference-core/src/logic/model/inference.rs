//! Inference Engine - scoring models behind one trait
//!
//! `Model` is the scoring capability (`predict_proba` over one tabular row).
//! Two artifact formats are supported: ONNX classifiers run through ONNX
//! Runtime, and JSON logistic-regression exports for lightweight models.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features::layout::{self, LayoutMismatchError, FEATURE_COUNT};
use crate::logic::features::TabularRow;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model artifact not found: {0}")]
    NotFound(String),

    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error("ONNX runtime error: {0}")]
    Runtime(String),

    #[error("invalid model output: {0}")]
    InvalidOutput(String),

    #[error("prediction failed: {0}")]
    Prediction(String),
}

// ============================================================================
// MODEL TRAIT
// ============================================================================

/// Binary classifier over one row
pub trait Model: Send + Sync {
    /// `[p(legit), p(fraud)]`
    fn predict_proba(&self, row: &TabularRow) -> Result<[f64; 2], InferenceError>;

    fn kind(&self) -> &'static str {
        "custom"
    }
}

// ============================================================================
// MODEL HANDLE
// ============================================================================

/// Loaded model plus provenance. Read-only after load, shared via `Arc`.
pub struct ModelHandle {
    uri: String,
    checksum: Option<String>,
    loaded_at: DateTime<Utc>,
    model: Arc<dyn Model>,
}

impl ModelHandle {
    pub fn new(uri: impl Into<String>, model: Arc<dyn Model>, checksum: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            checksum,
            loaded_at: Utc::now(),
            model,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn kind(&self) -> &'static str {
        self.model.kind()
    }

    /// Positive-class probability
    pub fn score(&self, row: &TabularRow) -> Result<f64, InferenceError> {
        let [_, fraud] = self.model.predict_proba(row)?;

        if !fraud.is_finite() || !(0.0..=1.0).contains(&fraud) {
            return Err(InferenceError::InvalidOutput(format!(
                "probability {} from {} outside [0, 1]",
                fraud, self.uri
            )));
        }

        Ok(fraud)
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("uri", &self.uri)
            .field("kind", &self.model.kind())
            .field("checksum", &self.checksum)
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

/// Preferred output of sklearn-onnx classifiers exported without zipmap
const PROBABILITY_OUTPUT: &str = "probabilities";

/// ONNX classifier. Sessions need exclusive access to run.
pub struct OnnxModel {
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxModel {
    pub fn from_file(path: &Path) -> Result<Self, InferenceError> {
        log::info!("Loading ONNX model from: {}", path.display());

        let session = Session::builder()
            .map_err(|e| InferenceError::Runtime(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Runtime(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| InferenceError::Runtime(format!("Failed to load model: {}", e)))?;

        let output_name = session.outputs.iter()
            .find(|o| o.name == PROBABILITY_OUTPUT)
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError::InvalidArtifact("No output defined".to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl Model for OnnxModel {
    fn predict_proba(&self, row: &TabularRow) -> Result<[f64; 2], InferenceError> {
        let input_array = Array2::<f32>::from_shape_vec((1, FEATURE_COUNT), row.to_array().to_vec())
            .map_err(|e| InferenceError::Prediction(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError::Runtime(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Prediction(format!("Inference failed: {}", e)))?;

        let output = outputs.get(self.output_name.as_str())
            .ok_or_else(|| InferenceError::InvalidOutput(format!("missing output {}", self.output_name)))?;

        let (_, data) = output.try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::InvalidOutput(format!("Extract error: {}", e)))?;

        match data {
            [legit, fraud, ..] => Ok([*legit as f64, *fraud as f64]),
            [fraud] => Ok([1.0 - *fraud as f64, *fraud as f64]),
            [] => Err(InferenceError::InvalidOutput("empty probability tensor".to_string())),
        }
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

// ============================================================================
// LINEAR (LOGISTIC) IMPLEMENTATION
// ============================================================================

/// JSON export of a logistic regression over `FEATURE_LAYOUT`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub intercept: f64,
    pub coefficients: HashMap<String, f64>,
    /// Layout hash at training time, checked when present
    #[serde(default)]
    pub layout_hash: Option<u32>,
}

/// Logistic regression with weights indexed by feature position
#[derive(Debug, Clone)]
pub struct LinearModel {
    intercept: f64,
    weights: [f64; FEATURE_COUNT],
}

impl LinearModel {
    pub fn from_artifact(artifact: LinearArtifact) -> Result<Self, InferenceError> {
        if let Some(hash) = artifact.layout_hash {
            layout::validate_layout(hash)?;
        }

        let mut weights = [0.0f64; FEATURE_COUNT];
        for (name, coef) in &artifact.coefficients {
            let index = layout::feature_index(name)
                .ok_or_else(|| InferenceError::InvalidArtifact(format!("unknown feature '{}'", name)))?;
            weights[index] = *coef;
        }

        Ok(Self {
            intercept: artifact.intercept,
            weights,
        })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, InferenceError> {
        let artifact: LinearArtifact = serde_json::from_slice(bytes)
            .map_err(|e| InferenceError::InvalidArtifact(e.to_string()))?;
        Self::from_artifact(artifact)
    }
}

impl Model for LinearModel {
    fn predict_proba(&self, row: &TabularRow) -> Result<[f64; 2], InferenceError> {
        let values = row.to_array();
        let logit = self.weights.iter()
            .zip(values.iter())
            .fold(self.intercept, |acc, (w, x)| acc + w * f64::from(*x));

        let fraud = 1.0 / (1.0 + (-logit).exp());
        Ok([1.0 - fraud, fraud])
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}
