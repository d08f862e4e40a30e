//! Response DTOs for the admission layer API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, Category};
use crate::quota::GlobalQuotaStats;

/// Response body for a cache hit (POST /cache/lookup)
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub category: Category,
    /// The stored value
    pub value: Value,
}

impl LookupResponse {
    pub fn new(category: Category, value: Value) -> Self {
        Self { category, value }
    }
}

/// Response body for a stored entry (PUT /cache)
#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    pub stored: bool,
    pub category: Category,
}

impl StoreResponse {
    pub fn new(stored: bool, category: Category) -> Self {
        Self { stored, category }
    }

    pub fn stored(category: Category) -> Self {
        Self::new(true, category)
    }
}

/// Response body for an admitted request (POST /gate/admit)
///
/// Denials are answered with 429 and the quota decision instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdmitResponse {
    /// The result is already known
    Cached { value: Value },
    /// Run the operation, then report the result to /gate/remember
    Proceed,
}

/// Response body for POST /cache/invalidate
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Whether an entry was present and removed
    pub removed: bool,
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Number of entries removed
    pub removed: usize,
    /// The cleared category; absent when every category was cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// Response body for the VIP endpoints (PUT/DELETE /quota/vip/:subject)
#[derive(Debug, Clone, Serialize)]
pub struct VipResponse {
    pub subject: String,
    pub is_vip: bool,
    /// False when the subject was already in the requested state
    pub changed: bool,
}

/// Response body for POST /quota/reset
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    /// Success message
    pub message: String,
}

impl ResetResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    pub quota: GlobalQuotaStats,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_response_serialize() {
        let resp = LookupResponse::new(Category::SearchResults, json!(["a", "b"]));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"category": "search", "value": ["a", "b"]}));
    }

    #[test]
    fn test_admit_response_serialize() {
        let cached = serde_json::to_value(AdmitResponse::Cached { value: json!("report") }).unwrap();
        assert_eq!(cached, json!({"status": "cached", "value": "report"}));

        let proceed = serde_json::to_value(AdmitResponse::Proceed).unwrap();
        assert_eq!(proceed, json!({"status": "proceed"}));
    }

    #[test]
    fn test_store_response_serialize() {
        let json = serde_json::to_value(StoreResponse::stored(Category::Analysis)).unwrap();
        assert_eq!(json["stored"], json!(true));
        assert_eq!(json["category"], json!("analysis"));
    }

    #[test]
    fn test_clear_response_omits_missing_category() {
        let all = ClearResponse {
            removed: 4,
            category: None,
        };
        assert_eq!(serde_json::to_value(all).unwrap(), json!({"removed": 4}));

        let one = ClearResponse {
            removed: 1,
            category: Some(Category::UrlContent),
        };
        assert_eq!(
            serde_json::to_value(one).unwrap(),
            json!({"removed": 1, "category": "url_content"})
        );
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
