//! API Module
//!
//! HTTP handlers and routing for the cache service admin API.
//!
//! # Endpoints
//! - `GET /health`, `GET /stats`, `GET /metrics`
//! - `DELETE /cache` - Clear every cache
//! - `POST /cleanup` - Sweep expired entries now
//! - `PUT /pricing`, `POST /pricing/lookup`
//! - `DELETE /pricing/service/:service_id`, `DELETE /pricing/date/:date`
//! - `PUT /availability`, `POST /availability/lookup`, `DELETE /availability/date/:date`
//! - `PUT|GET|DELETE /form-state/:form_id`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
