//! Transaction Events - immutable input records
//!
//! Events are produced upstream (generators, stream consumers) and validated
//! at the system boundary. The core never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_TRANSACTION_AMOUNT, MIN_EVENT_ID_LEN};

// ============================================================================
// CATEGORICALS
// ============================================================================

/// Countries accepted by the fraud model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    US,
    CA,
    GB,
    DE,
    FR,
    IN,
    BR,
}

impl Country {
    pub const ALL: [Country; 7] = [
        Country::US,
        Country::CA,
        Country::GB,
        Country::DE,
        Country::FR,
        Country::IN,
        Country::BR,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Country::US => "US",
            Country::CA => "CA",
            Country::GB => "GB",
            Country::DE => "DE",
            Country::FR => "FR",
            Country::IN => "IN",
            Country::BR => "BR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == value)
    }
}

/// Client devices accepted by the fraud model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Ios,
    Android,
    Web,
}

impl Device {
    pub const ALL: [Device; 3] = [Device::Ios, Device::Android, Device::Web];

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Ios => "ios",
            Device::Android => "android",
            Device::Web => "web",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.as_str() == value)
    }
}

// ============================================================================
// EVENT
// ============================================================================

/// A single card transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub user_id: String,
    pub transaction_amount: f64,
    pub country: Country,
    pub device: Device,
    pub event_ts: DateTime<Utc>,
    #[serde(default)]
    pub label: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("event_id too short: {0}")]
    EventIdTooShort(String),

    #[error("transaction_amount {0} outside [0, 5000]")]
    AmountOutOfRange(f64),

    #[error("event_ts {0} is in the future")]
    FutureTimestamp(DateTime<Utc>),

    #[error("label must be 0 or 1, got {0}")]
    InvalidLabel(u8),
}

impl Event {
    /// Check domain invariants.
    ///
    /// The HTTP boundary runs its own validation before conversion; this is
    /// for events built in code (replays, tests, generators).
    pub fn check(&self) -> Result<(), EventError> {
        if self.event_id.len() < MIN_EVENT_ID_LEN {
            return Err(EventError::EventIdTooShort(self.event_id.clone()));
        }

        let amount = self.transaction_amount;
        if !amount.is_finite() || !(0.0..=MAX_TRANSACTION_AMOUNT).contains(&amount) {
            return Err(EventError::AmountOutOfRange(amount));
        }

        if self.event_ts > Utc::now() {
            return Err(EventError::FutureTimestamp(self.event_ts));
        }

        match self.label {
            Some(label) if label > 1 => Err(EventError::InvalidLabel(label)),
            _ => Ok(()),
        }
    }
}

/// Body of a prediction call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub user_id: String,
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_event() -> Event {
        Event {
            event_id: "01HQA7F9G4G1YJ2R4D8K2J3A5S".to_string(),
            user_id: "user-1".to_string(),
            transaction_amount: 10.0,
            country: Country::US,
            device: Device::Ios,
            event_ts: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            label: Some(0),
        }
    }

    #[test]
    fn test_valid_event_passes() {
        assert!(sample_event().check().is_ok());
    }

    #[test]
    fn test_amount_bounds() {
        let mut event = sample_event();
        event.transaction_amount = 5000.0;
        assert!(event.check().is_ok());

        event.transaction_amount = 5000.01;
        assert_eq!(event.check(), Err(EventError::AmountOutOfRange(5000.01)));

        event.transaction_amount = -1.0;
        assert!(event.check().is_err());

        event.transaction_amount = f64::NAN;
        assert!(event.check().is_err());
    }

    #[test]
    fn test_future_timestamp_rejected() {
        let mut event = sample_event();
        event.event_ts = Utc::now() + Duration::hours(1);
        assert!(matches!(event.check(), Err(EventError::FutureTimestamp(_))));
    }

    #[test]
    fn test_short_event_id_and_label() {
        let mut event = sample_event();
        event.event_id = "short".to_string();
        assert!(matches!(event.check(), Err(EventError::EventIdTooShort(_))));

        let mut event = sample_event();
        event.label = Some(2);
        assert_eq!(event.check(), Err(EventError::InvalidLabel(2)));
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::json!({
            "event_id": "01HQA7F9G4G1YJ2R4D8K2J3A5S",
            "user_id": "user-1",
            "transaction_amount": 10.0,
            "country": "GB",
            "device": "android",
            "event_ts": "2024-01-01T00:00:00Z"
        });
        let event: Event = serde_json::from_value(json).unwrap();
        assert_eq!(event.country, Country::GB);
        assert_eq!(event.device, Device::Android);
        assert_eq!(event.label, None);

        let bad = serde_json::json!({
            "event_id": "01HQA7F9G4G1YJ2R4D8K2J3A5S",
            "user_id": "user-1",
            "transaction_amount": 10.0,
            "country": "XX",
            "device": "ios",
            "event_ts": "2024-01-01T00:00:00Z"
        });
        assert!(serde_json::from_value::<Event>(bad).is_err());
    }

    #[test]
    fn test_parse_categoricals() {
        assert_eq!(Country::parse("BR"), Some(Country::BR));
        assert_eq!(Country::parse("br"), None);
        assert_eq!(Device::parse("web"), Some(Device::Web));
        assert_eq!(Device::parse("tablet"), None);
    }
}
