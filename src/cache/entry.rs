//! Cache Entry Module
//!
//! Defines a stored response and the metadata tracked alongside it.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Bytes;

// == Cached Response ==
/// The serialized form of a downstream response, replayed verbatim on a hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code produced by the handler
    pub status: u16,
    /// Content-Type set by the handler, if any
    pub content_type: Option<String>,
    /// Serialized body
    pub body: Bytes,
}

impl CachedResponse {
    /// Creates a response from its status, content type and body bytes.
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// Shorthand for a JSON body.
    pub fn json(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(status, Some("application/json".to_string()), body)
    }

    /// Only 2xx responses may be stored.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Byte length of the serialized body.
    pub fn size_bytes(&self) -> u64 {
        self.body.len() as u64
    }
}

// == Cache Entry ==
/// A cached response with its lifetime and recorded size.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored response
    pub response: CachedResponse,
    /// Insertion timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Effective TTL applied at insertion, in seconds
    pub ttl_seconds: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Body size recorded once at insertion; all accounting uses this value
    pub size_bytes: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl_seconds` from now.
    ///
    /// # Arguments
    /// * `response` - The response to store
    /// * `ttl_seconds` - Effective TTL in seconds
    pub fn new(response: CachedResponse, ttl_seconds: u64) -> Self {
        let now = current_timestamp_ms();
        let size_bytes = response.size_bytes();

        Self {
            response,
            stored_at: now,
            ttl_seconds,
            expires_at: now.saturating_add(ttl_seconds.saturating_mul(1000)),
            size_bytes,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches `expires_at`, so a
    /// zero TTL is never served.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn sample_response() -> CachedResponse {
        CachedResponse::json(200, r#"{"id":1}"#)
    }

    #[test]
    fn test_entry_records_size_and_ttl() {
        let entry = CacheEntry::new(sample_response(), 60);

        assert_eq!(entry.size_bytes, 8);
        assert_eq!(entry.ttl_seconds, 60);
        assert_eq!(entry.expires_at, entry.stored_at + 60_000);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(sample_response(), 1);

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = CacheEntry::new(sample_response(), 0);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_success_range() {
        assert!(CachedResponse::json(200, "x").is_success());
        assert!(CachedResponse::json(204, "").is_success());
        assert!(CachedResponse::json(299, "x").is_success());
        assert!(!CachedResponse::json(304, "x").is_success());
        assert!(!CachedResponse::json(404, "x").is_success());
        assert!(!CachedResponse::json(500, "x").is_success());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            response: sample_response(),
            stored_at: now,
            ttl_seconds: 0,
            expires_at: now,
            size_bytes: 8,
        };

        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }
}
