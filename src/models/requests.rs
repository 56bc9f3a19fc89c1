//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{AvailabilityKey, PricingKey};

/// Maximum length of any identifier field, in bytes
pub const MAX_FIELD_LENGTH: usize = 256;

/// Request body for PUT /pricing
///
/// Key fields sit at the top level next to `value` and the optional `ttl`
/// (seconds).
#[derive(Debug, Clone, Deserialize)]
pub struct SetPricingRequest {
    #[serde(flatten)]
    pub key: PricingKey,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
}

/// Request body for PUT /availability
#[derive(Debug, Clone, Deserialize)]
pub struct SetAvailabilityRequest {
    #[serde(flatten)]
    pub key: AvailabilityKey,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
}

/// Request body for PUT /form-state/:form_id
#[derive(Debug, Clone, Deserialize)]
pub struct SetFormStateRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
}

/// Query string for GET/DELETE /form-state/:form_id
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormStateQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Returns an error message if validation fails, None if valid.
pub fn validate_pricing_key(key: &PricingKey) -> Option<String> {
    required("service_id", &key.service_id)
        .or_else(|| required("service_type", &key.service_type))
        .or_else(|| required("date", &key.date))
        .or_else(|| bounded("membership_level", &key.membership_level))
}

pub fn validate_availability_key(key: &AvailabilityKey) -> Option<String> {
    required("date", &key.date)
        .or_else(|| key.service_id.as_deref().and_then(|s| required("service_id", s)))
        .or_else(|| key.time_slot.as_deref().and_then(|s| bounded("time_slot", s)))
}

pub fn validate_form_id(form_id: &str) -> Option<String> {
    required("form_id", form_id)
}

fn required(field: &str, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return Some(format!("{field} cannot be empty"));
    }
    bounded(field, value)
}

fn bounded(field: &str, value: &str) -> Option<String> {
    if value.len() > MAX_FIELD_LENGTH {
        return Some(format!(
            "{field} exceeds maximum length of {MAX_FIELD_LENGTH} characters"
        ));
    }
    None
}
