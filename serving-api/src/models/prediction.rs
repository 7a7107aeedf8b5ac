//! Prediction request model
//!
//! Wire shape of `POST /predict`, validated here before anything reaches the
//! inference core.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use inference_core::{Country, Device, Event, InferenceRequest};

use crate::AppError;

#[derive(Debug, Deserialize, Validate)]
pub struct PredictRequest {
    #[validate(length(min = 1))]
    pub user_id: String,

    #[validate(nested)]
    pub event: EventPayload,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EventPayload {
    #[validate(length(min = 10))]
    pub event_id: String,

    #[validate(length(min = 1))]
    pub user_id: String,

    #[validate(range(min = 0.0, max = 5000.0))]
    pub transaction_amount: f64,

    #[validate(custom(function = "validate_country"))]
    pub country: String,

    #[validate(custom(function = "validate_device"))]
    pub device: String,

    #[validate(custom(function = "validate_not_future"))]
    pub event_ts: DateTime<Utc>,

    #[validate(range(min = 0, max = 1))]
    pub label: Option<u8>,
}

fn validate_country(country: &str) -> Result<(), ValidationError> {
    match Country::parse(country) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("unsupported_country")),
    }
}

fn validate_device(device: &str) -> Result<(), ValidationError> {
    match Device::parse(device) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("unsupported_device")),
    }
}

fn validate_not_future(ts: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *ts > Utc::now() {
        return Err(ValidationError::new("event_ts_in_future"));
    }
    Ok(())
}

impl TryFrom<PredictRequest> for InferenceRequest {
    type Error = AppError;

    fn try_from(req: PredictRequest) -> Result<Self, Self::Error> {
        let event = req.event;

        let country = Country::parse(&event.country)
            .ok_or_else(|| AppError::ValidationError(format!("unsupported country {}", event.country)))?;
        let device = Device::parse(&event.device)
            .ok_or_else(|| AppError::ValidationError(format!("unsupported device {}", event.device)))?;

        Ok(InferenceRequest {
            user_id: req.user_id,
            event: Event {
                event_id: event.event_id,
                user_id: event.user_id,
                transaction_amount: event.transaction_amount,
                country,
                device,
                event_ts: event.event_ts,
                label: event.label,
            },
        })
    }
}
