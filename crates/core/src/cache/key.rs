//! Cache key derivation.
//!
//! Keys are built from the normalized query text plus the serialized request
//! params, so the same question with different pagination never collides and
//! whitespace/case differences never fork entries.

use serde_json::Value;

/// Lowercase the query and collapse internal whitespace runs.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Compute the cache key for a query and its params.
///
/// The key stays human-readable (not hashed) so `invalidate` can match
/// regex patterns against stored keys.
pub fn cache_key(query: &str, params: &Value) -> String {
    format!("{}::{}", normalize_query(query), params)
}
