//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

/// Response body for cache lookups
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    /// Serialized cache key that was hit
    pub key: String,
    pub value: Value,
}

impl LookupResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for writes
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// Serialized cache key that was written
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for bulk invalidation and deletes
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// What was invalidated, e.g. `service:executive`
    pub target: String,
    /// Number of entries removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(target: impl Into<String>, removed: usize) -> Self {
        Self {
            target: target.into(),
            removed,
        }
    }
}

/// Generic acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" while running, "destroyed" after shutdown
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn healthy() -> Self {
        Self::new("healthy")
    }
}
