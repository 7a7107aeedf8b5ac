//! Core Configuration
//!
//! Static settings for the inference service. Loaded once at startup by the
//! host; nothing here is hot-reloaded.

use thiserror::Error;

use crate::constants::{DEFAULT_MODEL_VERSION, STAGING_MODEL_URI};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("canary split must be within [0, 1], got {0}")]
    InvalidSplit(f64),

    #[error("model cache capacity must be at least 1")]
    ZeroCacheCapacity,

    #[error("model cache capacity {capacity} cannot hold the {required} live variant models")]
    CacheTooSmall { capacity: usize, required: usize },
}

/// Which artifacts back each variant
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub baseline_uri: String,
    pub canary_uri: String,
    /// Label reported as `model_version` in every result
    pub model_version: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            baseline_uri: STAGING_MODEL_URI.to_string(),
            // No candidate registered yet: canary serves the baseline artifact
            canary_uri: STAGING_MODEL_URI.to_string(),
            model_version: DEFAULT_MODEL_VERSION.to_string(),
        }
    }
}

impl ServiceSettings {
    /// Distinct artifacts the live variants keep resident
    pub fn variant_model_count(&self) -> usize {
        if self.baseline_uri == self.canary_uri { 1 } else { 2 }
    }

    /// A cache smaller than the variant set reloads on every variant switch
    pub fn check_cache_capacity(&self, capacity: usize) -> Result<(), ConfigError> {
        let required = self.variant_model_count();
        if capacity < required {
            return Err(ConfigError::CacheTooSmall { capacity, required });
        }
        Ok(())
    }
}
