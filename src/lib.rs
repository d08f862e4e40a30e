//! Newsgate - admission layer for expensive analysis calls
//!
//! A memory-budgeted result cache with per-category TTLs and LRU eviction,
//! and a sliding-window quota manager with per-operation, global and VIP
//! limits. Both are exposed as a library and through an HTTP admin API.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod models;
pub mod quota;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{CacheConfig, Category, MemoCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{GateError, Result};
pub use gate::{Admission, AdmissionGate, GateOutcome};
pub use quota::{AdmissionDecision, DecisionReason, Operation, QuotaConfig, QuotaManager};
pub use tasks::{spawn_cache_sweep_task, spawn_quota_sweep_task, BackgroundTasks};
