//! Features Module - Feature Resolution
//!
//! Resolves user-scoped features for an event and flattens them into the
//! numeric row consumed by models.

pub mod layout;
pub mod vector;
pub mod store;
pub mod lookup;


// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, LayoutInfo};
pub use vector::{FeatureVector, TabularRow};
pub use store::{FeastConfig, FeastHttpStore, FeatureMap, FeatureStore, FeatureStoreError};
pub use lookup::{FeatureLookup, RawEventLookup, StoreFeatureLookup};
