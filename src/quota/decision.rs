//! Admission decisions returned by the quota manager.

use serde::Serialize;

/// Why a request was admitted or refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Allowed,
    UserLimitExceeded,
    GlobalLimitExceeded,
}

// == Admission Decision ==
/// Verdict for one request. Produced fresh per check, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub reason: DecisionReason,
    /// Seconds until a slot frees up; zero when allowed
    pub retry_after_secs: f64,
    /// Requests left for this subject in the current window
    pub remaining_user: u32,
    /// Requests left for everyone in the current window
    pub remaining_global: u32,
    /// Effective per-subject limit, VIP multiplier included
    pub user_limit: u32,
    pub global_limit: u32,
    pub is_vip: bool,
}

impl AdmissionDecision {
    /// Retry-after rounded up to whole seconds, as used by the HTTP `Retry-After` header.
    pub fn retry_after_whole_secs(&self) -> u64 {
        self.retry_after_secs.ceil() as u64
    }

    pub fn is_denied(&self) -> bool {
        !self.allowed
    }
}
