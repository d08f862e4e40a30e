//! Quota Statistics Module
//!
//! Cumulative request counters and the per-subject and global usage views.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::quota::Operation;

// == Subject Counters ==
/// Cumulative checks and denials for one subject.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SubjectCounters {
    pub requests: u64,
    pub blocked: u64,
}

impl SubjectCounters {
    pub fn record_request(&mut self) {
        self.requests += 1;
    }

    pub fn record_blocked(&mut self) {
        self.blocked += 1;
    }
}

// == Usage Views ==
/// Window usage of one operation for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationUsage {
    pub limit: u32,
    pub current: u32,
    pub remaining: u32,
}

impl OperationUsage {
    pub fn new(limit: u32, current: usize) -> Self {
        let current = u32::try_from(current).unwrap_or(u32::MAX);
        Self {
            limit,
            current,
            remaining: limit.saturating_sub(current),
        }
    }
}

/// Per-subject view.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectQuotaStats {
    pub subject: String,
    pub is_vip: bool,
    pub operations: BTreeMap<Operation, OperationUsage>,
    pub total_requests: u64,
    pub blocked_requests: u64,
}

/// Window usage of one operation across all subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlobalOperationUsage {
    pub limit: u32,
    pub current: u32,
    pub remaining: u32,
    /// Checks ever made for this operation
    pub total_requests: u64,
}

/// System-wide view.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalQuotaStats {
    pub total_requests: u64,
    pub blocked_requests: u64,
    /// Subjects currently holding at least one tracked window
    pub active_subjects: usize,
    /// Subjects held in memory until the next sweep, idle ones included
    pub tracked_subjects: usize,
    pub vip_count: usize,
    pub operations: BTreeMap<Operation, GlobalOperationUsage>,
}
