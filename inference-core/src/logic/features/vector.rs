//! Feature Vector & Tabular Row
//!
//! `FeatureVector` is what the lookup produces for one event.
//! `TabularRow` is the flat payload handed to models, live and shadow alike.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::layout::{COUNTRY_OFFSET, DEVICE_OFFSET, FEATURE_COUNT};
use crate::logic::events::{Country, Device, Event};

/// User-scoped features for a single inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub user_id: String,
    pub transaction_amount: f64,
    pub amount_zscore: Option<f64>,
    pub country_onehot: Option<BTreeMap<String, f64>>,
    pub device_onehot: Option<BTreeMap<String, f64>>,
    pub event_ts: DateTime<Utc>,
}

impl FeatureVector {
    /// Build from the event plus an optional store statistic
    pub fn from_event(event: &Event, amount_zscore: Option<f64>) -> Self {
        Self {
            user_id: event.user_id.clone(),
            transaction_amount: event.transaction_amount,
            amount_zscore,
            country_onehot: Some(country_onehot(event.country)),
            device_onehot: Some(device_onehot(event.device)),
            event_ts: event.event_ts,
        }
    }
}

fn country_onehot(country: Country) -> BTreeMap<String, f64> {
    Country::ALL
        .iter()
        .map(|c| (c.as_str().to_string(), if *c == country { 1.0 } else { 0.0 }))
        .collect()
}

fn device_onehot(device: Device) -> BTreeMap<String, f64> {
    Device::ALL
        .iter()
        .map(|d| (d.as_str().to_string(), if *d == device { 1.0 } else { 0.0 }))
        .collect()
}

// ============================================================================
// TABULAR ROW
// ============================================================================

/// One scoring row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularRow {
    pub transaction_amount: f64,
    pub amount_zscore: Option<f64>,
    pub country: Country,
    pub device: Device,
    pub event_ts: DateTime<Utc>,
}

impl TabularRow {
    pub fn new(features: &FeatureVector, event: &Event) -> Self {
        Self {
            transaction_amount: features.transaction_amount,
            amount_zscore: features.amount_zscore,
            country: event.country,
            device: event.device,
            event_ts: event.event_ts,
        }
    }

    /// Numeric encoding in `FEATURE_LAYOUT` order
    pub fn to_array(&self) -> [f32; FEATURE_COUNT] {
        let mut values = [0.0f32; FEATURE_COUNT];

        values[0] = self.transaction_amount as f32;
        values[1] = self.amount_zscore.unwrap_or(self.transaction_amount) as f32;

        if let Some(i) = Country::ALL.iter().position(|c| *c == self.country) {
            values[COUNTRY_OFFSET + i] = 1.0;
        }
        if let Some(i) = Device::ALL.iter().position(|d| *d == self.device) {
            values[DEVICE_OFFSET + i] = 1.0;
        }

        values[12] = self.event_ts.hour() as f32 / 23.0;
        values[13] = match self.event_ts.weekday() {
            Weekday::Sat | Weekday::Sun => 1.0,
            _ => 0.0,
        };

        values
    }
}
