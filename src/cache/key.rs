//! Cache Key Module
//!
//! Derives cache keys from request identity.
//!
//! Keys have the form `<METHOD>:<path>` or `<METHOD>:<path>?<query>`. A
//! custom key function may replace this; it must then return unique and
//! deterministic keys for distinct resources, which nothing here checks.

use std::fmt;
use std::sync::Arc;

use axum::http::{Method, Uri};

/// Custom key derivation supplied at route registration.
pub type KeyFn = Arc<dyn Fn(&RequestIdentity) -> String + Send + Sync>;

// == Request Identity ==
/// What the cache needs to know about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
}

impl RequestIdentity {
    pub fn new(method: Method, path: impl Into<String>, query: Option<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query,
        }
    }

    /// Builds an identity from a request line.
    pub fn from_parts(method: &Method, uri: &Uri) -> Self {
        Self::new(
            method.clone(),
            uri.path(),
            uri.query().map(|query| query.to_string()),
        )
    }

    /// Shorthand for a GET on `path_and_query`.
    pub fn get(path_and_query: &str) -> Self {
        match path_and_query.split_once('?') {
            Some((path, query)) => Self::new(Method::GET, path, Some(query.to_string())),
            None => Self::new(Method::GET, path_and_query, None),
        }
    }

    /// Whether this request may use the cache at all.
    pub fn is_cacheable(&self) -> bool {
        is_cacheable_method(&self.method)
    }

    /// The default key, `<METHOD>:<path>[?<query>]`.
    pub fn default_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}:{}?{}", self.method, self.path, query),
            None => write!(f, "{}:{}", self.method, self.path),
        }
    }
}

// == Key Derivation ==
/// Only GET responses are cached.
pub fn is_cacheable_method(method: &Method) -> bool {
    *method == Method::GET
}

/// Uses `key_fn` when supplied, the default key otherwise.
pub fn derive_key(identity: &RequestIdentity, key_fn: Option<&KeyFn>) -> String {
    match key_fn {
        Some(key_fn) => key_fn(identity),
        None => identity.default_key(),
    }
}

/// Key of the collection listing for `route`, as the cache derives it for
/// `GET /api/<route>`.
pub fn route_list_key(route: &str) -> String {
    RequestIdentity::new(Method::GET, format!("/api/{}", route), None).default_key()
}

/// Key of a single item, as derived for `GET /api/<route>/<id>`.
pub fn route_item_key(route: &str, id: &str) -> String {
    RequestIdentity::new(Method::GET, format!("/api/{}/{}", route, id), None).default_key()
}
