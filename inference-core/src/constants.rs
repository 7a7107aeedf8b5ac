//! Central Configuration Constants
//!
//! Single source of truth for serving defaults.
//! The serving binary reads overrides from the environment.

/// Scores strictly below this are approved, everything else goes to review
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Default canary traffic share
pub const DEFAULT_CANARY_SPLIT: f64 = 0.2;

/// Default seed for the variant RNG
pub const DEFAULT_CANARY_SEED: u64 = 42;

/// Default number of loaded model handles kept in memory
pub const DEFAULT_MODEL_CACHE_CAPACITY: usize = 4;

/// Shadow predictions allowed in flight before submissions are dropped
pub const DEFAULT_SHADOW_MAX_IN_FLIGHT: usize = 4;

/// Registry URI of the staging fraud model
pub const STAGING_MODEL_URI: &str = "models:/fraud-detector/Staging";

/// Version label reported in responses
pub const DEFAULT_MODEL_VERSION: &str = "staging";

/// Feature view queried for online features
pub const FEATURE_VIEW: &str = "transaction_features";

/// Online features requested per user
pub const ONLINE_FEATURES: &[&str] = &["transaction_amount", "label"];

/// Default feature server request timeout (milliseconds)
pub const DEFAULT_FEATURE_TIMEOUT_MS: u64 = 500;

/// Latency histogram buckets (seconds)
pub const LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.2, 0.5, 1.0];

/// Upper bound for a single transaction
pub const MAX_TRANSACTION_AMOUNT: f64 = 5000.0;

/// ULID-like ids are at least this long
pub const MIN_EVENT_ID_LEN: usize = 10;

/// Library version
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
