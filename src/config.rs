//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::{CacheConfig, Category, DEFAULT_MAX_MEMORY_MB};
use crate::error::{GateError, Result};
use crate::quota::{Operation, QuotaConfig};

/// Default interval between background sweeps, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Memory budget and per-category TTLs
    pub cache: CacheConfig,
    /// Per-operation limits, VIP multiplier and window length
    pub quota: QuotaConfig,
    /// Seconds between cache sweeps
    pub cache_sweep_interval: u64,
    /// Seconds between quota sweeps
    pub quota_sweep_interval: u64,
    /// Subjects registered as VIP at startup
    pub admin_user_ids: Vec<String>,
    pub enable_caching: bool,
    pub enable_rate_limiting: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_MAX_MEMORY_MB` - Cache memory budget (default: 100)
    /// - `CACHE_TTL_HOURS` - TTL of analysis results (default: 2)
    /// - `CACHE_SWEEP_INTERVAL` - Cache sweep frequency in seconds (default: 300)
    /// - `RATE_LIMIT_WINDOW` - Sliding window length in seconds (default: 60)
    /// - `MAX_REQUESTS_PER_MINUTE` - Per-subject text analysis limit (default: 10)
    /// - `MAX_URL_REQUESTS_PER_MINUTE` - Per-subject URL analysis limit (default: 5)
    /// - `MAX_IMAGE_REQUESTS_PER_MINUTE` - Per-subject image analysis limit (default: 3)
    /// - `ADMIN_RATE_MULTIPLIER` - VIP limit multiplier (default: 5)
    /// - `ADMIN_USER_IDS` - Comma-separated VIP subjects (default: none)
    /// - `QUOTA_SWEEP_INTERVAL` - Quota sweep frequency in seconds (default: 300)
    /// - `ENABLE_CACHING` - Look up and store results on the gated path (default: true)
    /// - `ENABLE_RATE_LIMITING` - Check quotas on the gated path (default: true)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config reading each variable through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_memory_mb = parsed(lookup("CACHE_MAX_MEMORY_MB"), DEFAULT_MAX_MEMORY_MB);
        let analysis_ttl_hours = parsed(
            lookup("CACHE_TTL_HOURS"),
            Category::Analysis.default_ttl_secs() / 3600,
        );
        let cache = CacheConfig::with_memory_mb(max_memory_mb)
            .ttl(Category::Analysis, analysis_ttl_hours.saturating_mul(3600));

        let mut quota = defaults.quota.clone();
        quota.window_secs = parsed(lookup("RATE_LIMIT_WINDOW"), quota.window_secs);
        quota.vip_multiplier = parsed(lookup("ADMIN_RATE_MULTIPLIER"), quota.vip_multiplier);
        for (variable, operation) in [
            ("MAX_REQUESTS_PER_MINUTE", Operation::TextAnalysis),
            ("MAX_URL_REQUESTS_PER_MINUTE", Operation::UrlAnalysis),
            ("MAX_IMAGE_REQUESTS_PER_MINUTE", Operation::ImageAnalysis),
        ] {
            let current = quota.base_limit(operation);
            quota
                .base_limits
                .insert(operation, parsed(lookup(variable), current));
        }

        let admin_user_ids = lookup("ADMIN_USER_IDS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            server_port: parsed(lookup("SERVER_PORT"), defaults.server_port),
            cache,
            quota,
            cache_sweep_interval: parsed(
                lookup("CACHE_SWEEP_INTERVAL"),
                defaults.cache_sweep_interval,
            ),
            quota_sweep_interval: parsed(
                lookup("QUOTA_SWEEP_INTERVAL"),
                defaults.quota_sweep_interval,
            ),
            admin_user_ids,
            enable_caching: flag(lookup("ENABLE_CACHING"), defaults.enable_caching),
            enable_rate_limiting: flag(
                lookup("ENABLE_RATE_LIMITING"),
                defaults.enable_rate_limiting,
            ),
        }
    }

    /// Rejects settings the cache or the quota manager cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache.limit_bytes == 0 {
            return Err(GateError::InvalidRequest(
                "Cache memory budget must be positive".to_string(),
            ));
        }
        if self.cache_sweep_interval == 0 || self.quota_sweep_interval == 0 {
            return Err(GateError::InvalidRequest(
                "Sweep intervals must be positive".to_string(),
            ));
        }
        self.quota.validate()
    }
}

fn parsed<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, case-insensitively.
fn flag(raw: Option<String>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1" | "yes" | "on") => true,
        Some("false" | "0" | "no" | "off") => false,
        _ => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache: CacheConfig::default(),
            quota: QuotaConfig::default(),
            cache_sweep_interval: DEFAULT_SWEEP_INTERVAL_SECS,
            quota_sweep_interval: DEFAULT_SWEEP_INTERVAL_SECS,
            admin_user_ids: Vec::new(),
            enable_caching: true,
            enable_rate_limiting: true,
        }
    }
}
