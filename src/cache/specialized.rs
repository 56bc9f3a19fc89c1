//! Specialized Caches
//!
//! Pricing, availability and form-state caches with their key builders and
//! dimension-based invalidation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::cache::keyed::{CacheKey, KeyedCache};
use crate::cache::CacheConfig;

// == Defaults ==
pub const PRICING_TTL: Duration = Duration::from_secs(15 * 60);
pub const PRICING_MAX_SIZE: usize = 500;
pub const AVAILABILITY_TTL: Duration = Duration::from_secs(5 * 60);
pub const AVAILABILITY_MAX_SIZE: usize = 200;
pub const FORM_STATE_TTL: Duration = Duration::from_secs(30 * 60);
pub const FORM_STATE_MAX_SIZE: usize = 50;

pub type PricingCache<T = serde_json::Value> = KeyedCache<PricingKey, T>;
pub type AvailabilityCache<T = serde_json::Value> = KeyedCache<AvailabilityKey, T>;
pub type FormStateCache<T = serde_json::Value> = KeyedCache<FormStateKey, T>;

/// Reduces a date or timestamp to its `YYYY-MM-DD` part.
///
/// `2025-08-21T14:30:00Z`, `2025-08-21 14:30` and `2025-08-21` all map to
/// `2025-08-21`, so lookups at different times of day share one entry.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let date = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
    date.chars().take(10).collect()
}

fn service_tag(service_id: &str) -> String {
    format!("service:{service_id}")
}

fn date_tag(date: &str) -> String {
    format!("date:{}", normalize_date(date))
}

// == Pricing ==
/// Inputs that determine a price quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingKey {
    pub service_id: String,
    pub service_type: String,
    pub duration_hours: u32,
    pub date: String,
    pub membership_level: String,
}

impl PricingKey {
    pub fn new(
        service_id: impl Into<String>,
        service_type: impl Into<String>,
        duration_hours: u32,
        date: &str,
        membership_level: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            service_type: service_type.into(),
            duration_hours,
            date: normalize_date(date),
            membership_level: membership_level.into(),
        }
    }
}

impl CacheKey for PricingKey {
    fn cache_key(&self) -> String {
        json!({
            "serviceId": self.service_id,
            "serviceType": self.service_type,
            "duration": self.duration_hours,
            "date": normalize_date(&self.date),
            "membershipLevel": self.membership_level,
        })
        .to_string()
    }

    fn tags(&self) -> Vec<String> {
        vec![service_tag(&self.service_id), date_tag(&self.date)]
    }
}

impl<T> KeyedCache<PricingKey, T> {
    pub fn default_config() -> CacheConfig {
        CacheConfig::new(PRICING_TTL, PRICING_MAX_SIZE)
    }

    /// Drops every quote for `service_id`.
    pub async fn invalidate_service(&self, service_id: &str) -> usize {
        self.shared().invalidate_tag(&service_tag(service_id)).await
    }

    /// Drops every quote for the day `date` falls on.
    pub async fn invalidate_date(&self, date: &str) -> usize {
        self.shared().invalidate_tag(&date_tag(date)).await
    }
}

// == Availability ==
/// Availability lookup, optionally narrowed to a service and a time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityKey {
    pub date: String,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub time_slot: Option<String>,
}

impl AvailabilityKey {
    pub fn new(date: &str) -> Self {
        Self {
            date: normalize_date(date),
            service_id: None,
            time_slot: None,
        }
    }

    pub fn for_service(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = Some(service_id.into());
        self
    }

    pub fn at(mut self, time_slot: impl Into<String>) -> Self {
        self.time_slot = Some(time_slot.into());
        self
    }
}

impl CacheKey for AvailabilityKey {
    fn cache_key(&self) -> String {
        json!({
            "date": normalize_date(&self.date),
            "serviceId": self.service_id,
            "timeSlot": self.time_slot,
        })
        .to_string()
    }

    fn tags(&self) -> Vec<String> {
        let mut tags = vec![date_tag(&self.date)];
        if let Some(service_id) = &self.service_id {
            tags.push(service_tag(service_id));
        }
        tags
    }
}

impl<T> KeyedCache<AvailabilityKey, T> {
    pub fn default_config() -> CacheConfig {
        CacheConfig::new(AVAILABILITY_TTL, AVAILABILITY_MAX_SIZE)
    }

    pub async fn invalidate_date(&self, date: &str) -> usize {
        self.shared().invalidate_tag(&date_tag(date)).await
    }

    /// Drops service-specific availability for `service_id`. Entries cached
    /// without a service are kept.
    pub async fn invalidate_service(&self, service_id: &str) -> usize {
        self.shared().invalidate_tag(&service_tag(service_id)).await
    }
}

// == Form State ==
/// Saved state of a partially filled form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormStateKey {
    pub form_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl FormStateKey {
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

impl CacheKey for FormStateKey {
    fn cache_key(&self) -> String {
        match &self.session_id {
            Some(session) => format!("form_state:{}:{}", self.form_id, session),
            None => format!("form_state:{}", self.form_id),
        }
    }

    fn tags(&self) -> Vec<String> {
        vec![format!("form:{}", self.form_id)]
    }
}

impl<T> KeyedCache<FormStateKey, T> {
    pub fn default_config() -> CacheConfig {
        CacheConfig::new(FORM_STATE_TTL, FORM_STATE_MAX_SIZE)
    }

    /// Drops the saved state of `form_id` across all sessions.
    pub async fn invalidate_form(&self, form_id: &str) -> usize {
        self.shared().invalidate_tag(&format!("form:{form_id}")).await
    }
}
