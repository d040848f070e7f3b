//! Cache Gate Module
//!
//! The request-facing decision point. A request is either bypassed, answered
//! from the cache, or handed to the downstream producer whose response is then
//! offered back for storage.
//!
//! The store lock is never held while the producer runs: `begin` locks for
//! the lookup, `complete` locks again for storage and eviction.

use std::future::Future;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use tokio::sync::RwLock;

use crate::cache::{derive_key, CacheStore, CachedResponse, KeyFn, Lookup, RequestIdentity};
use crate::config::CacheConfig;

/// Header telling clients whether the response came from the cache
pub const X_CACHE: &str = "x-cache";

// == Cache Status ==
/// How the gate handled a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// Not eligible for caching; the cache was not consulted
    Bypass,
}

impl CacheStatus {
    /// `X-Cache` header value, if any.
    pub fn header_value(&self) -> Option<&'static str> {
        match self {
            CacheStatus::Hit => Some("HIT"),
            CacheStatus::Miss => Some("MISS"),
            CacheStatus::Bypass => None,
        }
    }
}

// == Cache Headers ==
/// Headers the gate adds to an outgoing response. Never touches the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaders {
    pub status: CacheStatus,
    pub cache_control: Option<String>,
}

impl CacheHeaders {
    /// Served from cache; advertises the route's base duration.
    pub fn hit(base_ttl: u64) -> Self {
        Self {
            status: CacheStatus::Hit,
            cache_control: Some(public_max_age(base_ttl)),
        }
    }

    /// Produced downstream and cacheable.
    pub fn stored_miss(base_ttl: u64) -> Self {
        Self {
            status: CacheStatus::Miss,
            cache_control: Some(public_max_age(base_ttl)),
        }
    }

    /// Produced downstream but not cacheable.
    pub fn uncacheable_miss() -> Self {
        Self {
            status: CacheStatus::Miss,
            cache_control: Some("no-store".to_string()),
        }
    }

    pub fn bypass() -> Self {
        Self {
            status: CacheStatus::Bypass,
            cache_control: None,
        }
    }

    /// Writes `X-Cache` and `Cache-Control` into `headers`.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(value) = self.status.header_value() {
            headers.insert(X_CACHE, HeaderValue::from_static(value));
        }
        if let Some(value) = self
            .cache_control
            .as_deref()
            .and_then(|v| HeaderValue::from_str(v).ok())
        {
            headers.insert(header::CACHE_CONTROL, value);
        }
    }
}

fn public_max_age(base_ttl: u64) -> String {
    format!("public, max-age={}", base_ttl)
}

// == Admission ==
/// Result of the first phase of a gated request.
#[derive(Debug)]
pub enum Admission {
    /// Not eligible; run the handler as if the cache did not exist
    Bypass,
    /// Serve `response` as is
    Hit {
        response: CachedResponse,
        headers: CacheHeaders,
    },
    /// Run the handler, then hand its response to [`CacheGate::complete`]
    Miss(MissTicket),
}

/// Carries what the second phase of a miss needs.
#[derive(Debug)]
pub struct MissTicket {
    key: String,
    base_ttl: u64,
    generation: u64,
}

impl MissTicket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

// == Gate Response ==
/// A fully handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    pub response: CachedResponse,
    pub headers: CacheHeaders,
}

impl GateResponse {
    pub fn status(&self) -> CacheStatus {
        self.headers.status
    }
}

// == Cache Gate ==
/// Shared handle to one response cache. Cloning shares the same store.
#[derive(Debug, Clone, Default)]
pub struct CacheGate {
    pub(super) store: Arc<RwLock<CacheStore>>,
}

impl CacheGate {
    // == Constructor ==
    pub fn new(store: CacheStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(CacheStore::new(config))
    }

    // == Begin ==
    /// First phase: decides bypass, hit or miss for a request.
    ///
    /// Eligible requests count toward the key's popularity before the lookup.
    /// Ineligible ones leave the cache untouched.
    ///
    /// # Arguments
    /// * `identity` - Method and URL of the request
    /// * `base_ttl` - Route's base duration in seconds
    /// * `key_fn` - Optional custom key derivation
    pub async fn begin(
        &self,
        identity: &RequestIdentity,
        base_ttl: u64,
        key_fn: Option<&KeyFn>,
    ) -> Admission {
        if !identity.is_cacheable() {
            return Admission::Bypass;
        }

        let key = derive_key(identity, key_fn);
        let mut store = self.store.write().await;

        match store.lookup(&key) {
            Lookup::Hit(response) => Admission::Hit {
                response,
                headers: CacheHeaders::hit(base_ttl),
            },
            Lookup::Miss => Admission::Miss(MissTicket {
                generation: store.generation(&key),
                key,
                base_ttl,
            }),
        }
    }

    // == Complete ==
    /// Second phase of a miss: offers the produced response for storage and
    /// returns the headers to attach to it.
    ///
    /// If the key was cleared while the producer ran, the response may
    /// predate the write that cleared it; it is passed on but not stored.
    pub async fn complete(&self, ticket: MissTicket, response: &CachedResponse) -> CacheHeaders {
        if !response.is_success() {
            return CacheHeaders::uncacheable_miss();
        }

        let mut store = self.store.write().await;
        if store.generation(&ticket.key) != ticket.generation {
            tracing::debug!(key = %ticket.key, "key cleared during miss, not storing");
            return CacheHeaders::uncacheable_miss();
        }
        store.store(&ticket.key, response.clone(), ticket.base_ttl);
        CacheHeaders::stored_miss(ticket.base_ttl)
    }

    // == Handle ==
    /// Runs a whole request through the cache.
    ///
    /// `produce` is only awaited on a miss or a bypass.
    pub async fn handle<F, Fut>(
        &self,
        identity: &RequestIdentity,
        base_ttl: u64,
        key_fn: Option<&KeyFn>,
        produce: F,
    ) -> GateResponse
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CachedResponse>,
    {
        match self.begin(identity, base_ttl, key_fn).await {
            Admission::Bypass => GateResponse {
                response: produce().await,
                headers: CacheHeaders::bypass(),
            },
            Admission::Hit { response, headers } => GateResponse { response, headers },
            Admission::Miss(ticket) => {
                let response = produce().await;
                let headers = self.complete(ticket, &response).await;
                GateResponse { response, headers }
            }
        }
    }

    /// Shared store, for tasks that need direct access.
    pub fn store(&self) -> &Arc<RwLock<CacheStore>> {
        &self.store
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ok_body(body: &'static str) -> CachedResponse {
        CachedResponse::json(200, body)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let gate = CacheGate::default();
        let identity = RequestIdentity::get("/api/products");

        let first = gate
            .handle(&identity, 300, None, || async { ok_body("[1,2]") })
            .await;
        assert_eq!(first.status(), CacheStatus::Miss);
        assert_eq!(
            first.headers.cache_control.as_deref(),
            Some("public, max-age=300")
        );

        let second = gate
            .handle(&identity, 300, None, || async { ok_body("changed") })
            .await;
        assert_eq!(second.status(), CacheStatus::Hit);
        assert_eq!(second.response.body.as_ref(), b"[1,2]");
    }

    #[tokio::test]
    async fn test_response_cleared_mid_miss_is_not_stored() {
        let gate = CacheGate::default();
        let identity = RequestIdentity::get("/api/products/1");

        let stale = gate
            .handle(&identity, 60, None, || async {
                // A write lands while the old body is being produced
                gate.invalidate_route("products", Some("1")).await;
                ok_body(r#"{"price":20}"#)
            })
            .await;
        assert_eq!(stale.status(), CacheStatus::Miss);
        assert_eq!(stale.headers.cache_control.as_deref(), Some("no-store"));
        assert!(gate.store().read().await.is_empty());

        let fresh = gate
            .handle(&identity, 60, None, || async { ok_body(r#"{"price":25}"#) })
            .await;
        assert_eq!(fresh.status(), CacheStatus::Miss);
        assert_eq!(
            fresh.headers.cache_control.as_deref(),
            Some("public, max-age=60")
        );

        let cached = gate
            .handle(&identity, 60, None, || async { ok_body("unused") })
            .await;
        assert_eq!(cached.status(), CacheStatus::Hit);
        assert_eq!(cached.response.body.as_ref(), br#"{"price":25}"#);
    }

    #[tokio::test]
    async fn test_hit_does_not_run_producer() {
        let gate = CacheGate::default();
        let identity = RequestIdentity::get("/api/products/1");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            gate.handle(&identity, 60, None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                ok_body("{}")
            })
            .await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hit_advertises_base_not_extended_ttl() {
        let gate = CacheGate::default();
        let identity = RequestIdentity::get("/api/products");
        for _ in 0..11 {
            gate.store.write().await.lookup(&identity.default_key());
        }

        gate.handle(&identity, 60, None, || async { ok_body("x") })
            .await;
        let hit = gate
            .handle(&identity, 60, None, || async { ok_body("x") })
            .await;

        let store = gate.store.read().await;
        assert_eq!(store.entry("GET:/api/products").unwrap().ttl_seconds, 120);
        assert_eq!(hit.headers, CacheHeaders::hit(60));
    }

    #[tokio::test]
    async fn test_error_status_not_stored() {
        let gate = CacheGate::default();
        let identity = RequestIdentity::get("/api/products/404");

        let response = gate
            .handle(&identity, 60, None, || async {
                CachedResponse::json(404, r#"{"error":"not found"}"#)
            })
            .await;

        assert_eq!(response.headers, CacheHeaders::uncacheable_miss());
        assert_eq!(response.response.status, 404);
        assert!(gate.store.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_post_bypasses_cache() {
        let gate = CacheGate::default();
        let identity = RequestIdentity::new(Method::POST, "/api/products", None);

        let response = gate
            .handle(&identity, 300, None, || async { ok_body("created") })
            .await;

        assert_eq!(response.status(), CacheStatus::Bypass);
        let store = gate.store.read().await;
        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert!(stats.popularity.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_custom_key_fn_shares_entry() {
        let gate = CacheGate::default();
        let key_fn: KeyFn = Arc::new(|identity: &RequestIdentity| identity.path.clone());

        gate.handle(
            &RequestIdentity::get("/api/products?utm=a"),
            60,
            Some(&key_fn),
            || async { ok_body("list") },
        )
        .await;
        let second = gate
            .handle(
                &RequestIdentity::get("/api/products?utm=b"),
                60,
                Some(&key_fn),
                || async { ok_body("other") },
            )
            .await;

        assert_eq!(second.status(), CacheStatus::Hit);
        assert_eq!(gate.store.read().await.popularity("/api/products"), 2);
    }

    #[test]
    fn test_apply_headers() {
        let mut headers = HeaderMap::new();
        CacheHeaders::hit(300).apply(&mut headers);

        assert_eq!(headers.get(X_CACHE).unwrap(), "HIT");
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=300"
        );

        let mut headers = HeaderMap::new();
        CacheHeaders::bypass().apply(&mut headers);
        assert!(headers.is_empty());
    }
}
