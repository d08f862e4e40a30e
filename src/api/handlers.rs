//! API Handlers
//!
//! HTTP request handlers for the cache and quota administration endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::{CacheStats, EntryInfo, MemoCache};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{GateError, Result};
use crate::gate::{Admission, AdmissionGate};
use crate::models::{
    AdmitResponse, CacheKeyRequest, CacheSetRequest, ClearQuery, ClearResponse,
    GateAdmitRequest, GateRememberRequest, HealthResponse, InvalidateResponse, LookupResponse,
    QuotaCheckRequest, ResetRequest, ResetResponse, StatsResponse, StoreResponse,
    UpdateLimitsRequest, VipResponse,
};
use crate::quota::{
    AdmissionDecision, GlobalQuotaStats, QuotaConfig, QuotaManager, SubjectQuotaStats,
};

/// Application state shared across all handlers.
///
/// The cache and the quota manager are cloneable handles over shared,
/// internally locked state; the gate composes the same two handles.
#[derive(Debug, Clone)]
pub struct AppState {
    pub cache: MemoCache,
    pub quota: QuotaManager,
    pub gate: AdmissionGate,
}

impl AppState {
    /// Creates a new AppState around existing handles, with the gate fully enabled.
    pub fn new(cache: MemoCache, quota: QuotaManager) -> Self {
        let gate = AdmissionGate::new(quota.clone(), cache.clone());
        Self { cache, quota, gate }
    }

    /// Creates a new AppState from configuration on the system clock.
    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with_clock(config, SystemClock::shared())
    }

    /// Creates a new AppState from configuration.
    ///
    /// Registers the configured admin subjects as VIPs and applies the
    /// caching and rate-limiting switches to the gate.
    pub fn from_config_with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let cache = MemoCache::new(config.cache.clone(), clock.clone());
        let quota = QuotaManager::new(config.quota.clone(), clock);
        for subject in &config.admin_user_ids {
            quota.add_vip(subject);
        }

        let gate = AdmissionGate::new(quota.clone(), cache.clone())
            .with_caching(config.enable_caching)
            .with_rate_limiting(config.enable_rate_limiting);

        Self { cache, quota, gate }
    }
}

// == General ==

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
///
/// Returns cache statistics alongside the global quota view.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        cache: state.cache.stats(),
        quota: state.quota.global_stats(),
    })
}

// == Cache ==

/// Handler for POST /cache/lookup
pub async fn lookup_handler(
    State(state): State<AppState>,
    Json(req): Json<CacheKeyRequest>,
) -> Result<Json<LookupResponse>> {
    let category = req.category()?;

    state
        .cache
        .get(category, &req.content)
        .map(|value| Json(LookupResponse::new(category, value)))
        .ok_or_else(|| GateError::NotFound(format!("No cached {} entry", category)))
}

/// Handler for PUT /cache
///
/// Stores a result; responds 503 when the entry cannot fit the memory budget.
pub async fn store_handler(
    State(state): State<AppState>,
    Json(req): Json<CacheSetRequest>,
) -> Result<Json<StoreResponse>> {
    let category = req.category()?;

    if state.cache.set(category, &req.content, req.value, req.ttl) {
        Ok(Json(StoreResponse::stored(category)))
    } else {
        Err(GateError::CacheFull(format!(
            "{} entry does not fit the memory budget",
            category
        )))
    }
}

/// Handler for POST /cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<CacheKeyRequest>,
) -> Result<Json<InvalidateResponse>> {
    let category = req.category()?;
    let removed = state.cache.invalidate(category, &req.content);

    Ok(Json(InvalidateResponse { removed }))
}

/// Handler for POST /cache/entry
///
/// Returns metadata for one entry without touching its recency.
pub async fn entry_handler(
    State(state): State<AppState>,
    Json(req): Json<CacheKeyRequest>,
) -> Result<Json<EntryInfo>> {
    let category = req.category()?;

    state
        .cache
        .entry_info(category, &req.content)
        .map(Json)
        .ok_or_else(|| GateError::NotFound(format!("No {} entry", category)))
}

/// Handler for DELETE /cache?category=
pub async fn clear_handler(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> Result<Json<ClearResponse>> {
    let category = query.category()?;
    let removed = state.cache.clear(category);

    Ok(Json(ClearResponse { removed, category }))
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

// == Quota ==

/// Handler for POST /quota/check
///
/// Records the request when admitted. A denial answers 429 with the
/// decision as body and a `Retry-After` header in whole seconds.
pub async fn quota_check_handler(
    State(state): State<AppState>,
    Json(req): Json<QuotaCheckRequest>,
) -> Result<Response> {
    if let Some(error_msg) = req.validate() {
        return Err(GateError::InvalidRequest(error_msg));
    }
    let operation = req.operation()?;

    let decision = state.quota.check(&req.subject, operation);
    if decision.allowed {
        return Ok(Json(decision).into_response());
    }

    Ok(too_many_requests(decision))
}

/// 429 carrying the decision as body and a `Retry-After` header in whole seconds.
fn too_many_requests(decision: AdmissionDecision) -> Response {
    let retry_after = decision.retry_after_whole_secs().to_string();
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after)],
        Json(decision),
    )
        .into_response()
}

/// Handler for GET /quota/stats
pub async fn quota_stats_handler(State(state): State<AppState>) -> Json<GlobalQuotaStats> {
    Json(state.quota.global_stats())
}

/// Handler for GET /quota/subjects/:subject
pub async fn subject_stats_handler(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Json<SubjectQuotaStats> {
    Json(state.quota.subject_stats(&subject))
}

/// Handler for PUT /quota/vip/:subject
pub async fn add_vip_handler(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Json<VipResponse> {
    let changed = state.quota.add_vip(&subject);

    Json(VipResponse {
        subject,
        is_vip: true,
        changed,
    })
}

/// Handler for DELETE /quota/vip/:subject
pub async fn remove_vip_handler(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Json<VipResponse> {
    let changed = state.quota.remove_vip(&subject);

    Json(VipResponse {
        subject,
        is_vip: false,
        changed,
    })
}

/// Handler for POST /quota/reset
pub async fn reset_handler(
    State(state): State<AppState>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<ResetResponse>> {
    let operation = req.operation()?;
    let scope = operation.map_or_else(|| "all operations".to_string(), |op| op.to_string());

    let message = match req.subject.as_deref().map(str::trim) {
        Some(subject) if !subject.is_empty() => {
            state.quota.reset_subject(subject, operation);
            format!("Reset {} for subject '{}'", scope, subject)
        }
        _ => {
            state.quota.reset_global(operation);
            format!("Reset global windows for {}", scope)
        }
    };

    Ok(Json(ResetResponse::new(message)))
}

/// Handler for PUT /quota/limits
///
/// Returns the configuration now in force.
pub async fn update_limits_handler(
    State(state): State<AppState>,
    Json(req): Json<UpdateLimitsRequest>,
) -> Result<Json<QuotaConfig>> {
    let config =
        state
            .quota
            .update_limits(req.base_limits()?, req.global_limits()?, req.vip_multiplier)?;

    Ok(Json(config))
}

// == Gate ==

/// Handler for POST /gate/admit
///
/// Runs the quota check and the cache lookup of a gated call, honouring the
/// caching and rate-limiting switches. A denial answers 429 like
/// POST /quota/check.
pub async fn gate_admit_handler(
    State(state): State<AppState>,
    Json(req): Json<GateAdmitRequest>,
) -> Result<Response> {
    if let Some(error_msg) = req.validate() {
        return Err(GateError::InvalidRequest(error_msg));
    }
    let operation = req.operation()?;
    let category = req.category()?;

    let response = match state.gate.admit(&req.subject, operation, category, &req.content) {
        Admission::Denied(decision) => return Ok(too_many_requests(decision)),
        Admission::Cached(value) => AdmitResponse::Cached { value },
        Admission::Proceed => AdmitResponse::Proceed,
    };

    Ok(Json(response).into_response())
}

/// Handler for POST /gate/remember
///
/// Stores the result of an operation admitted by POST /gate/admit. Answers
/// `stored: false` rather than an error when caching is off or the entry
/// does not fit.
pub async fn gate_remember_handler(
    State(state): State<AppState>,
    Json(req): Json<GateRememberRequest>,
) -> Result<Json<StoreResponse>> {
    let category = req.category()?;
    let stored = state.gate.remember(category, &req.content, req.value);

    Ok(Json(StoreResponse::new(stored, category)))
}
