//! API Routes
//!
//! Configures the Axum router with the product and cache admin endpoints.

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, clear_cache_handler, create_product, delete_product, get_product,
    health_handler, list_products, product_item_key, update_product, AppState,
};
use super::middleware::{cache_response, RouteCache};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/products` - List products (cached)
/// - `POST /api/products` - Create a product
/// - `GET /api/products/:id` - Fetch one product (cached)
/// - `PUT /api/products/:id` - Replace a product
/// - `DELETE /api/products/:id` - Delete a product
/// - `GET /api/cache/stats` - Cache statistics
/// - `DELETE /api/cache` - Clear the cache
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Response cache on the two product routes, with per-route base TTLs
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let list_cache = RouteCache::new(state.cache.clone(), state.durations.list);
    let item_cache = RouteCache::new(state.cache.clone(), state.durations.item)
        .with_key_fn(Arc::new(product_item_key));

    Router::new()
        .route(
            "/api/products",
            get(list_products)
                .post(create_product)
                .layer(from_fn_with_state(list_cache, cache_response)),
        )
        .route(
            "/api/products/:id",
            get(get_product)
                .put(update_product)
                .delete(delete_product)
                .layer(from_fn_with_state(item_cache, cache_response)),
        )
        .route("/api/cache/stats", get(cache_stats_handler))
        .route("/api/cache", delete(clear_cache_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::from_config(&Config::default()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/cache/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_product_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/products")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"lamp","price":20}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get("x-cache").is_none());
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/products/404")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
    }
}
