//! Model Module - loading, caching and scoring
//!
//! - `inference` - `Model` trait, handles, ONNX and linear implementations
//! - `loader` - registry URI resolution and artifact loading
//! - `cache` - bounded memoizing handle cache
//! - `threshold` - score → decision

pub mod inference;
pub mod loader;
pub mod cache;
pub mod threshold;

// Re-export common types
pub use inference::{InferenceError, LinearModel, Model, ModelHandle, OnnxModel};
pub use loader::{ArtifactLoader, ModelLoader};
pub use cache::{LruModelCache, ModelCache, ModelLoadError};
pub use threshold::Decision;
