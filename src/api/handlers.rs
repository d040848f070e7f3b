//! API Handlers
//!
//! HTTP request handlers for the product routes and the cache admin routes.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::cache::{route_item_key, CacheGate, RequestIdentity};
use crate::catalog::{Product, ProductCatalog};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{HealthResponse, MessageResponse, ProductRequest, StatsResponse};

/// Route name used for cache invalidation of `/api/products`
pub const PRODUCTS_ROUTE: &str = "products";

/// Cache key for `GET /api/products/:id`.
///
/// Numeric ids are keyed in their canonical form, so `/api/products/01` and
/// `/api/products/1` share the entry that writes to product 1 invalidate.
pub fn product_item_key(identity: &RequestIdentity) -> String {
    let id = identity
        .path
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<u64>().ok());

    match id {
        Some(id) => {
            let key = route_item_key(PRODUCTS_ROUTE, &id.to_string());
            match &identity.query {
                Some(query) => format!("{}?{}", key, query),
                None => key,
            }
        }
        None => identity.default_key(),
    }
}

/// Base cache durations per route, in seconds.
#[derive(Debug, Clone, Copy)]
pub struct RouteDurations {
    /// GET /api/products
    pub list: u64,
    /// GET /api/products/:id
    pub item: u64,
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Response cache shared by every cached route
    pub cache: CacheGate,
    /// Thread-safe product storage
    pub catalog: Arc<RwLock<ProductCatalog>>,
    /// Base cache durations
    pub durations: RouteDurations,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: CacheGate, durations: RouteDurations) -> Self {
        Self {
            cache,
            catalog: Arc::new(RwLock::new(ProductCatalog::new())),
            durations,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CacheGate::from_config(&config.cache),
            RouteDurations {
                list: config.products_cache_duration,
                item: config.product_cache_duration,
            },
        )
    }
}

/// Handler for GET /api/products
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    let catalog = state.catalog.read().await;
    Json(catalog.list())
}

/// Handler for GET /api/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Product>> {
    let catalog = state.catalog.read().await;
    catalog
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("product {}", id)))
}

/// Handler for POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let product = state.catalog.write().await.create(req);
    state.cache.invalidate_route(PRODUCTS_ROUTE, None).await;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Handler for PUT /api/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let product = state
        .catalog
        .write()
        .await
        .update(id, req)
        .ok_or_else(|| ApiError::NotFound(format!("product {}", id)))?;
    state
        .cache
        .invalidate_route(PRODUCTS_ROUTE, Some(&id.to_string()))
        .await;

    Ok(Json(product))
}

/// Handler for DELETE /api/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MessageResponse>> {
    if !state.catalog.write().await.delete(id) {
        return Err(ApiError::NotFound(format!("product {}", id)));
    }
    state
        .cache
        .invalidate_route(PRODUCTS_ROUTE, Some(&id.to_string()))
        .await;

    Ok(Json(MessageResponse::new(format!("Product {} deleted", id))))
}

/// Handler for GET /api/cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.cache.stats().await;
    Json(StatsResponse::from_snapshot(&snapshot))
}

/// Handler for DELETE /api/cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.clear_all().await;
    Json(MessageResponse::new("Cache cleared successfully"))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
