//! Response Cache Middleware
//!
//! Puts a [`CacheGate`] in front of a route. Hits are answered without
//! running the handler; on a miss the handler's response is buffered,
//! offered to the cache and passed on with the cache headers added.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::cache::{Admission, CacheGate, CacheHeaders, CachedResponse, KeyFn, RequestIdentity};
use crate::error::ApiError;

// == Route Cache ==
/// Per-route cache registration: which cache, for how long, keyed how.
#[derive(Clone)]
pub struct RouteCache {
    gate: CacheGate,
    base_ttl: u64,
    key_fn: Option<KeyFn>,
}

impl RouteCache {
    /// Caches the route for `base_ttl` seconds under the default key.
    pub fn new(gate: CacheGate, base_ttl: u64) -> Self {
        Self {
            gate,
            base_ttl,
            key_fn: None,
        }
    }

    /// Replaces the default key derivation.
    pub fn with_key_fn(mut self, key_fn: KeyFn) -> Self {
        self.key_fn = Some(key_fn);
        self
    }
}

/// Middleware for use with `axum::middleware::from_fn_with_state`.
pub async fn cache_response(
    State(route): State<RouteCache>,
    request: Request,
    next: Next,
) -> Response {
    let identity = RequestIdentity::from_parts(request.method(), request.uri());

    let ticket = match route
        .gate
        .begin(&identity, route.base_ttl, route.key_fn.as_ref())
        .await
    {
        Admission::Bypass => return next.run(request).await,
        Admission::Hit { response, headers } => return replay(response, &headers),
        Admission::Miss(ticket) => ticket,
    };

    let (mut parts, body) = next.run(request).await.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(key = ticket.key(), error = %err, "could not buffer response body, not caching");
            let mut response =
                ApiError::Internal("failed to read response body".to_string()).into_response();
            CacheHeaders::uncacheable_miss().apply(response.headers_mut());
            return response;
        }
    };

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let cached = CachedResponse::new(parts.status.as_u16(), content_type, bytes);

    let headers = route.gate.complete(ticket, &cached).await;
    headers.apply(&mut parts.headers);

    Response::from_parts(parts, Body::from(cached.body))
}

/// Builds an HTTP response from a cached entry.
fn replay(cached: CachedResponse, headers: &CacheHeaders) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    let mut response = (status, cached.body).into_response();
    // The body conversion sets octet-stream; restore the original type
    response.headers_mut().remove(header::CONTENT_TYPE);
    if let Some(value) = cached
        .content_type
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    headers.apply(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::X_CACHE;
    use axum::{middleware::from_fn_with_state, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn counting_app(gate: CacheGate, calls: Arc<AtomicUsize>, status: StatusCode) -> Router {
        let layer = from_fn_with_state(RouteCache::new(gate, 30), cache_response);
        Router::new().route(
            "/api/widgets",
            get(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    (status, [(header::CONTENT_TYPE, "application/json")], "[1]")
                }
            })
            .post(|| async { StatusCode::CREATED })
            .layer(layer),
        )
    }

    async fn send(app: &Router, method: &str) -> Response {
        app.clone()
            .oneshot(
                axum::http::Request::builder()
                    .method(method)
                    .uri("/api/widgets")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_second_get_is_served_from_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(CacheGate::default(), calls.clone(), StatusCode::OK);

        let first = send(&app, "GET").await;
        assert_eq!(first.headers().get(X_CACHE).unwrap(), "MISS");

        let second = send(&app, "GET").await;
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers().get(X_CACHE).unwrap(), "HIT");
        assert_eq!(
            second.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            second.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=30"
        );
        let bytes = to_bytes(second.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), b"[1]");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_responses_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(CacheGate::default(), calls.clone(), StatusCode::NOT_FOUND);

        let first = send(&app, "GET").await;
        assert_eq!(first.status(), StatusCode::NOT_FOUND);
        assert_eq!(first.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(first.headers().get(X_CACHE).unwrap(), "MISS");

        send(&app, "GET").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_post_passes_through_untouched() {
        let gate = CacheGate::default();
        let app = counting_app(gate.clone(), Arc::new(AtomicUsize::new(0)), StatusCode::OK);

        let response = send(&app, "POST").await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get(X_CACHE).is_none());

        let stats = gate.stats().await;
        assert_eq!(stats.hits + stats.misses, 0);
        assert!(stats.popularity.is_empty());
    }

    #[tokio::test]
    async fn test_custom_key_ignores_query() {
        let gate = CacheGate::default();
        let key_fn: KeyFn =
            Arc::new(|identity: &RequestIdentity| format!("widgets:{}", identity.path));
        let route = RouteCache::new(gate.clone(), 30).with_key_fn(key_fn);
        let app = Router::new().route(
            "/api/widgets",
            get(|| async { "[1]" }).layer(from_fn_with_state(route, cache_response)),
        );

        for (uri, expected) in [("/api/widgets?a=1", "MISS"), ("/api/widgets?b=2", "HIT")] {
            let response = app
                .clone()
                .oneshot(
                    axum::http::Request::builder()
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.headers().get(X_CACHE).unwrap(), expected);
        }
        assert_eq!(gate.stats().await.popularity.get("widgets:/api/widgets"), Some(&2));
    }

    #[test]
    fn test_replay_keeps_status_and_type() {
        let cached = CachedResponse::new(203, Some("text/plain".to_string()), "hello");
        let response = replay(cached, &CacheHeaders::hit(5));

        assert_eq!(response.status().as_u16(), 203);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(response.headers().get(X_CACHE).unwrap(), "HIT");
    }
}
