//! Inference Core - canary routing and shadow evaluation for fraud scoring
//!
//! Host-agnostic: the serving binary wires concrete collaborators (Feast
//! client, artifact loader, seeded selector) into an [`InferenceService`]
//! and exposes `predict` / `health` over HTTP.

pub mod constants;
pub mod logic;

pub use logic::canary::{CanarySelector, FixedSelector, Variant, VariantDecision, VariantSelector};
pub use logic::config::{ConfigError, ServiceSettings};
pub use logic::events::{Country, Device, Event, EventError, InferenceRequest};
pub use logic::features::{
    FeastConfig, FeastHttpStore, FeatureLookup, FeatureStore, FeatureVector, RawEventLookup,
    StoreFeatureLookup, TabularRow,
};
pub use logic::metrics::InferenceMetrics;
pub use logic::model::{
    ArtifactLoader, Decision, InferenceError, LruModelCache, Model, ModelCache, ModelHandle,
    ModelLoadError, ModelLoader,
};
pub use logic::orchestrator::{
    Collaborators, HealthStatus, InferenceResult, InferenceService, PredictError, StartupError,
};
pub use logic::rollback::RollbackWatchdog;
pub use logic::shadow::{ShadowInvoker, ShadowRunner};
