//! API Module
//!
//! HTTP handlers and routing for the cache and quota administration API.
//!
//! # Endpoints
//! - `GET /health`, `GET /stats` - Liveness and combined statistics
//! - `/cache/...` - Store, look up, invalidate, inspect and clear results
//! - `/quota/...` - Admission checks, usage views, VIPs, resets and limits

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
