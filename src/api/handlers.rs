//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{system_clock, AvailabilityKey, CacheKey, Clock, FormStateKey, PricingKey};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::manager::{CacheManager, CleanupReport, ManagerState, ManagerStats};
use crate::models::requests::{
    validate_availability_key, validate_form_id, validate_pricing_key,
};
use crate::models::{
    FormStateQuery, HealthResponse, InvalidateResponse, LookupResponse, MessageResponse,
    SetAvailabilityRequest, SetFormStateRequest, SetPricingRequest, SetResponse,
};
use crate::monitor::{PerformanceMonitor, TimingStats};
use crate::tasks::Debouncer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<CacheManager>,
    pub monitor: PerformanceMonitor,
    pub debouncer: Debouncer,
    /// Debounced "log a stats snapshot" trigger
    stats_snapshot: Arc<dyn Fn(()) + Send + Sync>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("manager", &self.manager)
            .field("monitor", &self.monitor)
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Creates a new AppState around an existing manager.
    pub fn new(manager: Arc<CacheManager>, stats_debounce: Duration) -> Self {
        let debouncer = Debouncer::new();
        let snapshot_source = Arc::clone(&manager);
        let stats_snapshot = debouncer.debounce(
            "stats-snapshot",
            move |()| {
                let manager = Arc::clone(&snapshot_source);
                tokio::spawn(async move {
                    let stats = manager.stats().await;
                    info!(
                        total_entries = stats.total_entries,
                        pricing = stats.pricing.size,
                        availability = stats.availability.size,
                        form_state = stats.form_state.size,
                        "Cache stats snapshot"
                    );
                });
            },
            stats_debounce,
        );

        Self {
            manager,
            monitor: PerformanceMonitor::new(),
            debouncer,
            stats_snapshot: Arc::new(stats_snapshot),
        }
    }

    /// Creates a new AppState from configuration and starts the sweep.
    ///
    /// Must be called inside a tokio runtime.
    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with_clock(config, system_clock())
    }

    pub fn from_config_with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let manager = CacheManager::start(config.manager_config(), clock);
        Self::new(manager, config.stats_debounce())
    }

    fn ensure_running(&self) -> Result<()> {
        if self.manager.is_destroyed() {
            return Err(CacheError::Destroyed);
        }
        Ok(())
    }

    fn note_write(&self) {
        (self.stats_snapshot)(());
    }
}

fn ttl_from_secs(ttl: Option<u64>) -> Option<Duration> {
    ttl.map(Duration::from_secs)
}

// == Service Endpoints ==

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    match state.manager.state() {
        ManagerState::Running => Json(HealthResponse::healthy()),
        ManagerState::Destroyed => Json(HealthResponse::new("destroyed")),
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<ManagerStats> {
    Json(state.manager.stats().await)
}

/// Handler for GET /metrics
pub async fn metrics_handler(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, TimingStats>> {
    Json(state.monitor.stats())
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.manager.clear_all().await;
    Json(MessageResponse::new("All caches cleared"))
}

/// Handler for POST /cleanup
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<CleanupReport> {
    let _timing = state.monitor.start_timing("cleanup");
    Json(state.manager.cleanup_now().await)
}

// == Pricing ==

/// Handler for PUT /pricing
pub async fn set_pricing_handler(
    State(state): State<AppState>,
    Json(req): Json<SetPricingRequest>,
) -> Result<Json<SetResponse>> {
    state.ensure_running()?;
    if let Some(error_msg) = validate_pricing_key(&req.key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .manager
        .pricing()
        .set(&req.key, req.value, ttl_from_secs(req.ttl))
        .await;
    state.note_write();

    Ok(Json(SetResponse::new(req.key.cache_key())))
}

/// Handler for POST /pricing/lookup
pub async fn lookup_pricing_handler(
    State(state): State<AppState>,
    Json(key): Json<PricingKey>,
) -> Result<Json<LookupResponse>> {
    if let Some(error_msg) = validate_pricing_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let _timing = state.monitor.start_timing("pricing_lookup");
    let cache_key = key.cache_key();
    match state.manager.pricing().get(&key).await {
        Some(value) => Ok(Json(LookupResponse::new(cache_key, value))),
        None => Err(CacheError::NotFound(cache_key)),
    }
}

/// Handler for DELETE /pricing/service/:service_id
pub async fn invalidate_pricing_service_handler(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.manager.pricing().invalidate_service(&service_id).await;
    Json(InvalidateResponse::new(format!("service:{service_id}"), removed))
}

/// Handler for DELETE /pricing/date/:date
pub async fn invalidate_pricing_date_handler(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.manager.pricing().invalidate_date(&date).await;
    Json(InvalidateResponse::new(format!("date:{date}"), removed))
}

// == Availability ==

/// Handler for PUT /availability
pub async fn set_availability_handler(
    State(state): State<AppState>,
    Json(req): Json<SetAvailabilityRequest>,
) -> Result<Json<SetResponse>> {
    state.ensure_running()?;
    if let Some(error_msg) = validate_availability_key(&req.key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .manager
        .availability()
        .set(&req.key, req.value, ttl_from_secs(req.ttl))
        .await;
    state.note_write();

    Ok(Json(SetResponse::new(req.key.cache_key())))
}

/// Handler for POST /availability/lookup
pub async fn lookup_availability_handler(
    State(state): State<AppState>,
    Json(key): Json<AvailabilityKey>,
) -> Result<Json<LookupResponse>> {
    if let Some(error_msg) = validate_availability_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let _timing = state.monitor.start_timing("availability_lookup");
    let cache_key = key.cache_key();
    match state.manager.availability().get(&key).await {
        Some(value) => Ok(Json(LookupResponse::new(cache_key, value))),
        None => Err(CacheError::NotFound(cache_key)),
    }
}

/// Handler for DELETE /availability/date/:date
pub async fn invalidate_availability_date_handler(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.manager.availability().invalidate_date(&date).await;
    Json(InvalidateResponse::new(format!("date:{date}"), removed))
}

// == Form State ==

fn form_key(form_id: String, session_id: Option<String>) -> Result<FormStateKey> {
    if let Some(error_msg) = validate_form_id(&form_id) {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    let key = FormStateKey::new(form_id);
    Ok(match session_id {
        Some(session) => key.with_session(session),
        None => key,
    })
}

/// Handler for PUT /form-state/:form_id
pub async fn set_form_state_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Json(req): Json<SetFormStateRequest>,
) -> Result<Json<SetResponse>> {
    state.ensure_running()?;
    let key = form_key(form_id, req.session_id)?;

    state
        .manager
        .form_state()
        .set(&key, req.value, ttl_from_secs(req.ttl))
        .await;
    state.note_write();

    Ok(Json(SetResponse::new(key.cache_key())))
}

/// Handler for GET /form-state/:form_id
pub async fn get_form_state_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Query(query): Query<FormStateQuery>,
) -> Result<Json<LookupResponse>> {
    let key = form_key(form_id, query.session_id)?;
    let cache_key = key.cache_key();

    let value: Option<Value> = state.manager.form_state().get(&key).await;
    value
        .map(|value| Json(LookupResponse::new(cache_key.clone(), value)))
        .ok_or(CacheError::NotFound(cache_key))
}

/// Handler for DELETE /form-state/:form_id
///
/// With `session_id` only that session's state is removed, otherwise every
/// session of the form.
pub async fn delete_form_state_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Query(query): Query<FormStateQuery>,
) -> Result<Json<InvalidateResponse>> {
    let scoped = query.session_id.is_some();
    let key = form_key(form_id, query.session_id)?;
    let cache = state.manager.form_state();

    let removed = if scoped {
        usize::from(cache.delete(&key).await)
    } else {
        cache.invalidate_form(&key.form_id).await
    };

    Ok(Json(InvalidateResponse::new(key.cache_key(), removed)))
}
