//! Request and Response models for the cache service API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    FormStateQuery, SetAvailabilityRequest, SetFormStateRequest, SetPricingRequest,
};
pub use responses::{
    HealthResponse, InvalidateResponse, LookupResponse, MessageResponse, SetResponse,
};
