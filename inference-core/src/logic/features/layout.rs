//! Model Input Layout
//!
//! Slot order of the numeric row every fraud model is trained on. Any edit
//! to the slot list (added, reordered or removed names) bumps
//! `FEATURE_VERSION`, which changes the layout hash.
//!
//! Artifacts record the layout hash they were trained against; loaders
//! refuse artifacts whose hash differs.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// SLOTS
// ============================================================================

pub const FEATURE_VERSION: u8 = 1;

/// Feature names in exact order they appear in the model input row
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Amount (0-1) ===
    "transaction_amount",    // 0: Raw amount
    "amount_zscore",         // 1: Store statistic, raw amount on fallback

    // === Country one-hot (2-8) ===
    "country_US",
    "country_CA",
    "country_GB",
    "country_DE",
    "country_FR",
    "country_IN",
    "country_BR",

    // === Device one-hot (9-11) ===
    "device_ios",
    "device_android",
    "device_web",

    // === Time (12-13) ===
    "hour_of_day",           // 12: UTC hour scaled to [0, 1]
    "is_weekend",            // 13: 1.0 on Saturday/Sunday
];

/// Total number of features
/// Must match FEATURE_LAYOUT.len()
pub const FEATURE_COUNT: usize = 14;

/// First one-hot slot of each categorical block
pub const COUNTRY_OFFSET: usize = 2;
pub const DEVICE_OFFSET: usize = 9;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 of version + ordered names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

/// Layout description, logged at model load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
#[error("feature layout mismatch: expected hash {expected:08x}, artifact has {actual:08x}")]
pub struct LayoutMismatchError {
    pub expected: u32,
    pub actual: u32,
}

/// Check an artifact's recorded layout hash against the compiled layout
pub fn validate_layout(artifact_hash: u32) -> Result<(), LayoutMismatchError> {
    let expected = layout_hash();
    if artifact_hash != expected {
        return Err(LayoutMismatchError { expected, actual: artifact_hash });
    }
    Ok(())
}

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}
