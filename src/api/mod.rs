//! API Module
//!
//! HTTP handlers, the response cache middleware and routing.
//!
//! # Endpoints
//! - `GET|POST /api/products` - Product listing (cached) and creation
//! - `GET|PUT|DELETE /api/products/:id` - One product (GET cached)
//! - `GET /api/cache/stats` - Cache statistics
//! - `DELETE /api/cache` - Clear the cache
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use middleware::{cache_response, RouteCache};
pub use routes::create_router;
