//! Request DTOs for the admission layer API
//!
//! Defines the structure of incoming HTTP request bodies. Category and
//! operation names arrive as plain strings so that an unknown name is
//! reported as a 400 with the offending value.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::Category;
use crate::error::{GateError, Result};
use crate::quota::{LimitTable, Operation};

/// Request body addressing one cache entry
/// (POST /cache/lookup, /cache/invalidate, /cache/entry)
#[derive(Debug, Clone, Deserialize)]
pub struct CacheKeyRequest {
    /// Category name, e.g. `analysis`
    pub category: String,
    /// Content the key is derived from; any JSON value
    pub content: Value,
}

impl CacheKeyRequest {
    pub fn category(&self) -> Result<Category> {
        self.category.parse()
    }
}

/// Request body for storing a result (PUT /cache)
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSetRequest {
    pub category: String,
    pub content: Value,
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds overriding the category TTL; `0` never expires
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl CacheSetRequest {
    pub fn category(&self) -> Result<Category> {
        self.category.parse()
    }
}

/// Query string for clearing the cache (DELETE /cache?category=)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearQuery {
    #[serde(default)]
    pub category: Option<String>,
}

impl ClearQuery {
    /// `None` clears every category.
    pub fn category(&self) -> Result<Option<Category>> {
        self.category.as_deref().map(Category::from_str).transpose()
    }
}

/// Request body for an admission check (POST /quota/check)
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaCheckRequest {
    pub subject: String,
    /// Operation name; defaults to `general`
    #[serde(default)]
    pub operation: Option<String>,
}

impl QuotaCheckRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.subject.trim().is_empty() {
            return Some("Subject cannot be empty".to_string());
        }
        None
    }

    pub fn operation(&self) -> Result<Operation> {
        parse_operation(self.operation.as_deref())
    }
}

/// Request body for a gated admission (POST /gate/admit)
#[derive(Debug, Clone, Deserialize)]
pub struct GateAdmitRequest {
    pub subject: String,
    /// Operation name; defaults to `general`
    #[serde(default)]
    pub operation: Option<String>,
    pub category: String,
    pub content: Value,
}

impl GateAdmitRequest {
    pub fn validate(&self) -> Option<String> {
        if self.subject.trim().is_empty() {
            return Some("Subject cannot be empty".to_string());
        }
        None
    }

    pub fn operation(&self) -> Result<Operation> {
        parse_operation(self.operation.as_deref())
    }

    pub fn category(&self) -> Result<Category> {
        self.category.parse()
    }
}

/// Request body reporting the result of an admitted operation (POST /gate/remember)
#[derive(Debug, Clone, Deserialize)]
pub struct GateRememberRequest {
    pub category: String,
    pub content: Value,
    pub value: Value,
}

impl GateRememberRequest {
    pub fn category(&self) -> Result<Category> {
        self.category.parse()
    }
}

/// Request body for resetting quota windows (POST /quota/reset)
///
/// With a subject, resets that subject; without one, resets the global
/// windows. The operation narrows either reset to a single operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
}

impl ResetRequest {
    pub fn operation(&self) -> Result<Option<Operation>> {
        self.operation.as_deref().map(Operation::from_str).transpose()
    }
}

/// Request body for replacing limits (PUT /quota/limits)
///
/// Each supplied table replaces the current one wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLimitsRequest {
    #[serde(default)]
    pub base_limits: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub global_limits: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub vip_multiplier: Option<u32>,
}

impl UpdateLimitsRequest {
    pub fn base_limits(&self) -> Result<Option<LimitTable>> {
        self.base_limits.as_ref().map(limit_table).transpose()
    }

    pub fn global_limits(&self) -> Result<Option<LimitTable>> {
        self.global_limits.as_ref().map(limit_table).transpose()
    }
}

fn parse_operation(name: Option<&str>) -> Result<Operation> {
    name.map_or(Ok(Operation::General), Operation::from_str)
}

fn limit_table(raw: &BTreeMap<String, u32>) -> Result<LimitTable> {
    raw.iter()
        .map(|(name, limit)| Ok::<_, GateError>((name.parse::<Operation>()?, *limit)))
        .collect()
}
