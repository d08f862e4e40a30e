//! Sweep Tasks
//!
//! Background tasks that periodically sweep the cache and the quota ledger.
//! Neither sweep is needed for correctness; they bound memory between
//! requests.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::cache::MemoCache;
use crate::config::Config;
use crate::quota::QuotaManager;

/// Spawns a background task that periodically sweeps the cache.
///
/// Each run removes expired entries and, if usage is over the limit, evicts
/// least-recently-used entries down to the low-water mark.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cache_sweep_task(cache: MemoCache, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache sweep task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = cache.sweep();
            if report.expired > 0 || report.evicted > 0 {
                info!(
                    "Cache sweep: removed {} expired entries, evicted {} for memory",
                    report.expired, report.evicted
                );
            } else {
                debug!("Cache sweep: nothing to remove");
            }
        }
    })
}

/// Spawns a background task that periodically sweeps the quota ledger.
pub fn spawn_quota_sweep_task(quota: QuotaManager, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting quota sweep task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = quota.sweep();
            if report.removed_subjects > 0 {
                info!(
                    "Quota sweep: dropped {} idle subjects",
                    report.removed_subjects
                );
            }
        }
    })
}

// == Background Tasks ==
/// Handles of both sweep tasks, aborted together on shutdown.
#[derive(Debug)]
pub struct BackgroundTasks {
    cache_sweep: JoinHandle<()>,
    quota_sweep: JoinHandle<()>,
}

impl BackgroundTasks {
    /// Starts both sweeps at their configured intervals.
    pub fn start(state: &AppState, config: &Config) -> Self {
        Self {
            cache_sweep: spawn_cache_sweep_task(state.cache.clone(), config.cache_sweep_interval),
            quota_sweep: spawn_quota_sweep_task(state.quota.clone(), config.quota_sweep_interval),
        }
    }

    pub fn shutdown(&self) {
        self.cache_sweep.abort();
        self.quota_sweep.abort();
        warn!("Sweep tasks aborted");
    }

    pub fn is_finished(&self) -> bool {
        self.cache_sweep.is_finished() && self.quota_sweep.is_finished()
    }
}
