//! Popcache - an in-memory HTTP response cache
//!
//! Caches successful GET responses, extends the lifetime of popular ones and
//! evicts the least popular when the resident size passes its ceiling.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheGate;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
