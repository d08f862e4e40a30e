//! API Routes
//!
//! Configures the Axum router with all administration endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_vip_handler, cache_stats_handler, clear_handler, entry_handler, gate_admit_handler,
    gate_remember_handler, health_handler, invalidate_handler, lookup_handler, quota_check_handler, quota_stats_handler,
    remove_vip_handler, reset_handler, stats_handler, store_handler, subject_stats_handler,
    update_limits_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /stats` - Cache and quota statistics
/// - `PUT /cache` - Store a result
/// - `DELETE /cache?category=` - Clear one category or everything
/// - `POST /cache/lookup` - Look a result up
/// - `POST /cache/invalidate` - Remove one result
/// - `POST /cache/entry` - Entry metadata
/// - `GET /cache/stats` - Cache statistics
/// - `POST /quota/check` - Admission check, 429 when denied
/// - `GET /quota/stats` - Global quota usage
/// - `GET /quota/subjects/:subject` - Per-subject quota usage
/// - `PUT /quota/vip/:subject` / `DELETE /quota/vip/:subject` - VIP membership
/// - `POST /quota/reset` - Reset subject or global windows
/// - `PUT /quota/limits` - Replace limits
/// - `POST /gate/admit` - Gated admission: 429, cached result or proceed
/// - `POST /gate/remember` - Store the result of an admitted operation
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", put(store_handler).delete(clear_handler))
        .route("/cache/lookup", post(lookup_handler))
        .route("/cache/invalidate", post(invalidate_handler))
        .route("/cache/entry", post(entry_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/quota/check", post(quota_check_handler))
        .route("/quota/stats", get(quota_stats_handler))
        .route("/quota/subjects/:subject", get(subject_stats_handler))
        .route(
            "/quota/vip/:subject",
            put(add_vip_handler).delete(remove_vip_handler),
        )
        .route("/quota/reset", post(reset_handler))
        .route("/quota/limits", put(update_limits_handler))
        .route("/gate/admit", post(gate_admit_handler))
        .route("/gate/remember", post(gate_remember_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
