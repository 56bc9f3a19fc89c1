//! API Routes
//!
//! Configures the Axum router with all cache service endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cleanup_handler, clear_handler, delete_form_state_handler, get_form_state_handler,
    health_handler, invalidate_availability_date_handler, invalidate_pricing_date_handler,
    invalidate_pricing_service_handler, lookup_availability_handler, lookup_pricing_handler,
    metrics_handler, set_availability_handler, set_form_state_handler, set_pricing_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))
        .route("/cache", delete(clear_handler))
        .route("/cleanup", post(cleanup_handler))
        .route("/pricing", put(set_pricing_handler))
        .route("/pricing/lookup", post(lookup_pricing_handler))
        .route(
            "/pricing/service/:service_id",
            delete(invalidate_pricing_service_handler),
        )
        .route("/pricing/date/:date", delete(invalidate_pricing_date_handler))
        .route("/availability", put(set_availability_handler))
        .route("/availability/lookup", post(lookup_availability_handler))
        .route(
            "/availability/date/:date",
            delete(invalidate_availability_date_handler),
        )
        .route(
            "/form-state/:form_id",
            put(set_form_state_handler)
                .get(get_form_state_handler)
                .delete(delete_form_state_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
