//! Configuration module

use std::env;

use inference_core::constants::{
    DEFAULT_CANARY_SEED, DEFAULT_CANARY_SPLIT, DEFAULT_FEATURE_TIMEOUT_MS,
    DEFAULT_MODEL_CACHE_CAPACITY, DEFAULT_MODEL_VERSION, DEFAULT_SHADOW_MAX_IN_FLIGHT,
    STAGING_MODEL_URI,
};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Environment (local, staging, production)
    pub environment: String,

    /// Share of traffic routed to the canary, validated at startup
    pub canary_split: f64,

    /// Seed for the variant RNG
    pub canary_seed: u64,

    /// Replay requests against the shadow model
    pub shadow_enabled: bool,

    /// Shadow runs outstanding before new ones are dropped
    pub shadow_max_in_flight: usize,

    pub baseline_model_uri: String,
    pub canary_model_uri: String,
    pub shadow_model_uri: String,

    /// Local mirror of the model registry
    pub model_registry_dir: String,

    /// Version label in responses
    pub model_version: String,

    pub model_cache_capacity: usize,

    /// Feast feature server
    pub feast_server_url: String,
    pub feature_timeout_ms: u64,

    /// Canary exceptions per window that trigger a rollback (0 disables)
    pub rollback_threshold: u64,
    pub rollback_interval_secs: u64,
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    parse_value(key, env::var(key).ok(), default)
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!("Ignoring unparsable {}={:?}, using default", key, value);
                default
            }
        },
    }
}

fn flag_or(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let baseline_model_uri = env::var("BASELINE_MODEL_URI")
            .unwrap_or_else(|_| STAGING_MODEL_URI.to_string());

        Self {
            port: parse_or("PORT", 8000),

            environment: env::var("ENV")
                .unwrap_or_else(|_| "local".to_string()),

            canary_split: parse_or("CANARY_SPLIT", DEFAULT_CANARY_SPLIT),
            canary_seed: parse_or("CANARY_SEED", DEFAULT_CANARY_SEED),
            shadow_enabled: flag_or("SHADOW_ENABLED", true),
            shadow_max_in_flight: parse_or("SHADOW_MAX_IN_FLIGHT", DEFAULT_SHADOW_MAX_IN_FLIGHT),

            // No candidate registered yet: canary and shadow default to the baseline
            canary_model_uri: env::var("CANARY_MODEL_URI")
                .unwrap_or_else(|_| baseline_model_uri.clone()),
            shadow_model_uri: env::var("SHADOW_MODEL_URI")
                .unwrap_or_else(|_| baseline_model_uri.clone()),
            baseline_model_uri,

            model_registry_dir: env::var("MODEL_REGISTRY_DIR")
                .unwrap_or_else(|_| "./model-registry".to_string()),

            model_version: env::var("MODEL_VERSION")
                .unwrap_or_else(|_| DEFAULT_MODEL_VERSION.to_string()),

            model_cache_capacity: parse_or("MODEL_CACHE_CAPACITY", DEFAULT_MODEL_CACHE_CAPACITY),

            feast_server_url: env::var("FEAST_SERVER_URL")
                .unwrap_or_else(|_| "http://localhost:6566".to_string()),
            feature_timeout_ms: parse_or("FEATURE_TIMEOUT_MS", DEFAULT_FEATURE_TIMEOUT_MS),

            rollback_threshold: parse_or("ROLLBACK_THRESHOLD", 5),
            rollback_interval_secs: parse_or("ROLLBACK_INTERVAL_SECS", 300),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("CANARY_SPLIT", Some("0.35".to_string()), 0.2), 0.35);
        assert_eq!(parse_value("PORT", Some(" 9000 ".to_string()), 8000u16), 9000);
        assert_eq!(parse_value("PORT", None, 8000u16), 8000);
    }

    #[test]
    fn test_unparsable_value_falls_back() {
        assert_eq!(parse_value("CANARY_SPLIT", Some("twenty".to_string()), 0.2), 0.2);
        assert_eq!(parse_value("MODEL_CACHE_CAPACITY", Some("-1".to_string()), 4usize), 4);
    }
}
