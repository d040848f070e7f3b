//! Request and Response models for the API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::ProductRequest;
pub use responses::{
    HealthResponse, MessageResponse, PopularResources, StatsResponse, POPULAR_RESOURCES_LIMIT,
};
