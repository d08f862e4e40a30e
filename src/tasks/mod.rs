//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache sweep: removes expired entries and relieves memory pressure
//! - Quota sweep: prunes stale window timestamps and drops idle subjects

mod sweep;

pub use sweep::{spawn_cache_sweep_task, spawn_quota_sweep_task, BackgroundTasks};
