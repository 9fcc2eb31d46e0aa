use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A cached upstream response: everything needed to replay it to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    /// HTTP status code as received from the origin
    pub status: u16,
    /// Response headers, hop-by-hop headers already stripped
    pub headers: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
    /// Unix timestamp of when the response was stored
    pub stored_at: u64,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            stored_at: unix_now(),
        }
    }

    /// Whether the origin answered with a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Statistics for one cache store
#[derive(Debug, Default, Clone, Serialize)]
pub struct StoreStats {
    /// Number of live entries
    pub entries: usize,
    /// Bytes appended to the body log (stale records included)
    pub size_bytes: u64,
    /// Number of PUT operations
    pub puts: u64,
    /// Number of lookups that found an entry
    pub hits: u64,
    /// Number of lookups that found nothing
    pub misses: u64,
}

impl StoreStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
