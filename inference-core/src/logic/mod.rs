//! Logic Module - Inference Core
//!
//! - `events` - transaction events and requests
//! - `features/` - feature store client, lookup with fallback, model row layout
//! - `canary` - per-request variant selection
//! - `model/` - model loading, handle cache, scoring, decision threshold
//! - `shadow` - detached shadow evaluation
//! - `metrics` - Prometheus counters and latency histogram
//! - `orchestrator/` - the per-request pipeline
//! - `rollback` - canary demotion on exception spikes

pub mod config;
pub mod events;
pub mod features;
pub mod canary;
pub mod model;
pub mod shadow;
pub mod metrics;
pub mod orchestrator;
pub mod rollback;
