//! Quota Ledger Module
//!
//! Sliding-window bookkeeping for every subject and the global aggregate.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::quota::{
    AdmissionDecision, DecisionReason, GlobalOperationUsage, GlobalQuotaStats, LimitTable,
    Operation, OperationUsage, QuotaConfig, SlidingWindow, SubjectCounters, SubjectQuotaStats,
};

// == Sweep Report ==
/// What one full sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaSweepReport {
    /// Timestamps dropped from subject and global windows
    pub pruned: usize,
    /// Subjects dropped because none of their windows had anything left
    pub removed_subjects: usize,
}

#[derive(Debug, Default)]
struct SubjectState {
    windows: HashMap<Operation, SlidingWindow>,
    counters: SubjectCounters,
}

// == Quota Ledger ==
/// Per-subject and global sliding-window rate limiter.
///
/// Not synchronized; see [`crate::quota::QuotaManager`] for the shared handle.
#[derive(Debug)]
pub struct QuotaLedger {
    config: QuotaConfig,
    subjects: HashMap<String, SubjectState>,
    global: HashMap<Operation, SlidingWindow>,
    vips: HashSet<String>,
    total_requests: u64,
    blocked_requests: u64,
    operation_requests: HashMap<Operation, u64>,
    clock: Arc<dyn Clock>,
}

impl QuotaLedger {
    pub fn new(config: QuotaConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            subjects: HashMap::new(),
            global: HashMap::new(),
            vips: HashSet::new(),
            total_requests: 0,
            blocked_requests: 0,
            operation_requests: HashMap::new(),
            clock,
        }
    }

    // == Check ==
    /// Decides whether `subject` may run `operation` now, recording the
    /// request only when it is admitted.
    ///
    /// The subject's own limit is checked before the global one, and a
    /// denied request consumes neither budget.
    pub fn check(&mut self, subject: &str, operation: Operation) -> AdmissionDecision {
        let now = self.clock.now_ms();
        let window_ms = self.config.window_ms();
        let cutoff = now.saturating_sub(window_ms);

        let is_vip = self.vips.contains(subject);
        let user_limit = self.user_limit(is_vip, operation);
        let global_limit = self.config.global_limit(operation);

        self.total_requests += 1;
        *self.operation_requests.entry(operation).or_insert(0) += 1;

        let state = self.subjects.entry(subject.to_string()).or_default();
        state.counters.record_request();

        let user_window = state.windows.entry(operation).or_default();
        user_window.prune(cutoff);
        let global_window = self.global.entry(operation).or_default();
        global_window.prune(cutoff);

        let user_count = user_window.len();
        let global_count = global_window.len();

        if user_count >= user_limit as usize {
            state.counters.record_blocked();
            self.blocked_requests += 1;

            let retry_after_secs = user_window.retry_after_secs(now, window_ms);
            warn!(
                "Quota exceeded for subject {} on {}: {}/{} (retry in {:.1}s)",
                subject, operation, user_count, user_limit, retry_after_secs
            );

            return AdmissionDecision {
                allowed: false,
                reason: DecisionReason::UserLimitExceeded,
                retry_after_secs,
                remaining_user: 0,
                remaining_global: remaining(global_limit, global_count),
                user_limit,
                global_limit,
                is_vip,
            };
        }

        if global_count >= global_limit as usize {
            state.counters.record_blocked();
            self.blocked_requests += 1;

            let retry_after_secs = global_window.retry_after_secs(now, window_ms);
            warn!(
                "Global quota exceeded on {}: {}/{} (subject {}, retry in {:.1}s)",
                operation, global_count, global_limit, subject, retry_after_secs
            );

            return AdmissionDecision {
                allowed: false,
                reason: DecisionReason::GlobalLimitExceeded,
                retry_after_secs,
                remaining_user: remaining(user_limit, user_count),
                remaining_global: 0,
                user_limit,
                global_limit,
                is_vip,
            };
        }

        user_window.record(now);
        global_window.record(now);

        AdmissionDecision {
            allowed: true,
            reason: DecisionReason::Allowed,
            retry_after_secs: 0.0,
            remaining_user: remaining(user_limit, user_window.len()),
            remaining_global: remaining(global_limit, global_window.len()),
            user_limit,
            global_limit,
            is_vip,
        }
    }

    fn user_limit(&self, is_vip: bool, operation: Operation) -> u32 {
        let base = self.config.base_limit(operation);
        if is_vip {
            base.saturating_mul(self.config.vip_multiplier)
        } else {
            base
        }
    }

    // == VIP Membership ==
    pub fn add_vip(&mut self, subject: &str) -> bool {
        let added = self.vips.insert(subject.to_string());
        if added {
            info!("Subject {} added to VIP set", subject);
        }
        added
    }

    pub fn remove_vip(&mut self, subject: &str) -> bool {
        let removed = self.vips.remove(subject);
        if removed {
            info!("Subject {} removed from VIP set", subject);
        }
        removed
    }

    pub fn is_vip(&self, subject: &str) -> bool {
        self.vips.contains(subject)
    }

    // == Resets ==
    /// Clears one operation window of `subject`, or all of its windows.
    pub fn reset_subject(&mut self, subject: &str, operation: Option<Operation>) {
        match operation {
            Some(operation) => {
                if let Some(window) = self
                    .subjects
                    .get_mut(subject)
                    .and_then(|state| state.windows.get_mut(&operation))
                {
                    window.clear();
                }
            }
            None => {
                if let Some(state) = self.subjects.get_mut(subject) {
                    state.windows.clear();
                }
            }
        }
        info!(
            "Quota reset for subject {} ({})",
            subject,
            operation.map_or("all operations", |op| op.as_str())
        );
    }

    /// Clears the global window of one operation, or of all operations.
    pub fn reset_global(&mut self, operation: Option<Operation>) {
        match operation {
            Some(operation) => {
                if let Some(window) = self.global.get_mut(&operation) {
                    window.clear();
                }
            }
            None => self.global.clear(),
        }
        info!(
            "Global quota reset ({})",
            operation.map_or("all operations", |op| op.as_str())
        );
    }

    // == Update Limits ==
    /// Replaces each supplied table wholesale; omitted parts are kept.
    pub fn update_limits(
        &mut self,
        base_limits: Option<LimitTable>,
        global_limits: Option<LimitTable>,
        vip_multiplier: Option<u32>,
    ) -> Result<QuotaConfig> {
        let mut next = self.config.clone();
        if let Some(table) = base_limits {
            next.base_limits = table;
        }
        if let Some(table) = global_limits {
            next.global_limits = table;
        }
        if let Some(multiplier) = vip_multiplier {
            next.vip_multiplier = multiplier;
        }
        next.validate()?;

        self.config = next;
        info!("Quota limits updated: {:?}", self.config);
        Ok(self.config.clone())
    }

    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    // == Sweep ==
    /// Prunes every window, then drops empty windows and idle subjects.
    pub fn sweep(&mut self) -> QuotaSweepReport {
        let cutoff = self.clock.now_ms().saturating_sub(self.config.window_ms());
        let mut report = QuotaSweepReport::default();

        self.subjects.retain(|_, state| {
            state.windows.retain(|_, window| {
                report.pruned += window.prune(cutoff);
                !window.is_empty()
            });
            let keep = !state.windows.is_empty();
            if !keep {
                report.removed_subjects += 1;
            }
            keep
        });

        self.global.retain(|_, window| {
            report.pruned += window.prune(cutoff);
            !window.is_empty()
        });

        debug!(
            "Quota sweep: pruned {} timestamps, removed {} idle subjects",
            report.pruned, report.removed_subjects
        );
        report
    }

    // == Stats ==
    pub fn subject_stats(&self, subject: &str) -> SubjectQuotaStats {
        let cutoff = self.cutoff();
        let is_vip = self.is_vip(subject);
        let state = self.subjects.get(subject);

        let operations = Operation::ALL
            .into_iter()
            .map(|operation| {
                let current = state
                    .and_then(|s| s.windows.get(&operation))
                    .map_or(0, |w| w.count_since(cutoff));
                (
                    operation,
                    OperationUsage::new(self.user_limit(is_vip, operation), current),
                )
            })
            .collect::<BTreeMap<_, _>>();

        let counters = state.map(|s| s.counters).unwrap_or_default();

        SubjectQuotaStats {
            subject: subject.to_string(),
            is_vip,
            operations,
            total_requests: counters.requests,
            blocked_requests: counters.blocked,
        }
    }

    pub fn global_stats(&self) -> GlobalQuotaStats {
        let cutoff = self.cutoff();

        let operations = Operation::ALL
            .into_iter()
            .map(|operation| {
                let usage = OperationUsage::new(
                    self.config.global_limit(operation),
                    self.global.get(&operation).map_or(0, |w| w.count_since(cutoff)),
                );
                (
                    operation,
                    GlobalOperationUsage {
                        limit: usage.limit,
                        current: usage.current,
                        remaining: usage.remaining,
                        total_requests: self
                            .operation_requests
                            .get(&operation)
                            .copied()
                            .unwrap_or(0),
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();

        GlobalQuotaStats {
            total_requests: self.total_requests,
            blocked_requests: self.blocked_requests,
            active_subjects: self
                .subjects
                .values()
                .filter(|s| !s.windows.is_empty())
                .count(),
            tracked_subjects: self.tracked_subjects(),
            vip_count: self.vips.len(),
            operations,
        }
    }

    /// Number of subjects currently tracked, idle or not.
    fn tracked_subjects(&self) -> usize {
        self.subjects.len()
    }

    fn cutoff(&self) -> u64 {
        self.clock.now_ms().saturating_sub(self.config.window_ms())
    }
}

fn remaining(limit: u32, count: usize) -> u32 {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    limit.saturating_sub(count)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn ledger_with(config: QuotaConfig) -> (QuotaLedger, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let ledger = QuotaLedger::new(config, Arc::new(clock.clone()));
        (ledger, clock)
    }

    fn limits(user: u32, global: u32) -> QuotaConfig {
        QuotaConfig {
            base_limits: LimitTable::from([(Operation::General, user)]),
            global_limits: LimitTable::from([(Operation::General, global)]),
            vip_multiplier: 5,
            window_secs: 60,
        }
    }

    #[test]
    fn test_allows_until_user_limit() {
        let (mut ledger, _) = ledger_with(limits(3, 100));

        for expected_remaining in [2, 1, 0] {
            let decision = ledger.check("alice", Operation::TextAnalysis);
            assert!(decision.allowed);
            assert_eq!(decision.reason, DecisionReason::Allowed);
            assert_eq!(decision.remaining_user, expected_remaining);
        }

        let denied = ledger.check("alice", Operation::TextAnalysis);
        assert!(!denied.allowed);
        assert_eq!(denied.reason, DecisionReason::UserLimitExceeded);
        assert_eq!(denied.retry_after_secs, 60.0);

        let stats = ledger.subject_stats("alice");
        assert_eq!(stats.operations[&Operation::TextAnalysis].current, 3);
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.blocked_requests, 1);
    }

    #[test]
    fn test_user_denial_does_not_touch_global() {
        let (mut ledger, _) = ledger_with(limits(1, 100));

        ledger.check("alice", Operation::General);
        for _ in 0..5 {
            ledger.check("alice", Operation::General);
        }

        let global = ledger.global_stats();
        assert_eq!(global.operations[&Operation::General].current, 1);
        assert_eq!(global.operations[&Operation::General].total_requests, 6);
        assert_eq!(global.blocked_requests, 5);
    }

    #[test]
    fn test_global_limit_spans_subjects() {
        let (mut ledger, _) = ledger_with(limits(5, 3));

        assert!(ledger.check("a", Operation::General).allowed);
        assert!(ledger.check("b", Operation::General).allowed);
        assert!(ledger.check("c", Operation::General).allowed);

        let denied = ledger.check("d", Operation::General);
        assert_eq!(denied.reason, DecisionReason::GlobalLimitExceeded);
        assert_eq!(denied.remaining_global, 0);
        assert_eq!(denied.remaining_user, 5);

        // The global denial recorded nothing against the subject
        assert_eq!(ledger.subject_stats("d").operations[&Operation::General].current, 0);
    }

    #[test]
    fn test_operations_are_independent() {
        let (mut ledger, _) = ledger_with(QuotaConfig::default());

        for _ in 0..3 {
            assert!(ledger.check("alice", Operation::ImageAnalysis).allowed);
        }
        assert!(!ledger.check("alice", Operation::ImageAnalysis).allowed);
        assert!(ledger.check("alice", Operation::UrlAnalysis).allowed);
    }

    #[test]
    fn test_window_slides() {
        let (mut ledger, clock) = ledger_with(limits(2, 100));

        ledger.check("alice", Operation::General);
        clock.advance_secs(30);
        ledger.check("alice", Operation::General);
        assert!(!ledger.check("alice", Operation::General).allowed);

        // First request is exactly 60s old: still inside the window
        clock.advance_secs(30);
        assert!(!ledger.check("alice", Operation::General).allowed);

        clock.advance_ms(1);
        assert!(ledger.check("alice", Operation::General).allowed);
    }

    #[test]
    fn test_retry_after_decreases() {
        let (mut ledger, clock) = ledger_with(limits(3, 100));

        for _ in 0..3 {
            ledger.check("alice", Operation::General);
        }
        let first = ledger.check("alice", Operation::General);
        clock.advance_secs(5);
        let second = ledger.check("alice", Operation::General);

        assert!(first.retry_after_secs <= 60.0);
        assert_eq!(second.retry_after_secs, 55.0);
        assert!(second.retry_after_secs < first.retry_after_secs);
    }

    #[test]
    fn test_vip_multiplier() {
        let (mut ledger, _) = ledger_with(limits(10, 1_000));
        ledger.add_vip("boss");

        for _ in 0..50 {
            assert!(ledger.check("boss", Operation::General).allowed);
        }
        let denied = ledger.check("boss", Operation::General);
        assert_eq!(denied.reason, DecisionReason::UserLimitExceeded);
        assert_eq!(denied.user_limit, 50);
        assert!(denied.is_vip);

        for _ in 0..10 {
            assert!(ledger.check("pleb", Operation::General).allowed);
        }
        assert!(!ledger.check("pleb", Operation::General).allowed);
    }

    #[test]
    fn test_vip_removal_takes_effect_immediately() {
        let (mut ledger, _) = ledger_with(limits(1, 100));

        assert!(ledger.add_vip("boss"));
        assert!(!ledger.add_vip("boss"));
        ledger.check("boss", Operation::General);
        assert!(ledger.check("boss", Operation::General).allowed);

        assert!(ledger.remove_vip("boss"));
        assert!(!ledger.is_vip("boss"));
        assert!(!ledger.check("boss", Operation::General).allowed);
    }

    #[test]
    fn test_vip_does_not_scale_global_limit() {
        let (mut ledger, _) = ledger_with(limits(10, 4));
        ledger.add_vip("boss");

        for _ in 0..4 {
            assert!(ledger.check("boss", Operation::General).allowed);
        }
        let denied = ledger.check("boss", Operation::General);
        assert_eq!(denied.reason, DecisionReason::GlobalLimitExceeded);
        assert_eq!(denied.global_limit, 4);
    }

    #[test]
    fn test_reset_subject() {
        let (mut ledger, _) = ledger_with(limits(1, 100));

        ledger.check("alice", Operation::TextAnalysis);
        ledger.check("alice", Operation::UrlAnalysis);

        ledger.reset_subject("alice", Some(Operation::TextAnalysis));
        assert!(ledger.check("alice", Operation::TextAnalysis).allowed);
        assert!(!ledger.check("alice", Operation::UrlAnalysis).allowed);

        ledger.reset_subject("alice", None);
        assert!(ledger.check("alice", Operation::UrlAnalysis).allowed);
    }

    #[test]
    fn test_reset_global() {
        let (mut ledger, _) = ledger_with(limits(10, 1));

        ledger.check("a", Operation::TextAnalysis);
        ledger.check("a", Operation::UrlAnalysis);
        assert!(!ledger.check("b", Operation::TextAnalysis).allowed);

        ledger.reset_global(Some(Operation::TextAnalysis));
        assert!(ledger.check("b", Operation::TextAnalysis).allowed);
        assert!(!ledger.check("b", Operation::UrlAnalysis).allowed);

        ledger.reset_global(None);
        assert!(ledger.check("b", Operation::UrlAnalysis).allowed);
    }

    #[test]
    fn test_update_limits_replaces_tables() {
        let (mut ledger, _) = ledger_with(QuotaConfig::default());

        let updated = ledger
            .update_limits(Some(LimitTable::from([(Operation::UrlAnalysis, 1)])), None, None)
            .unwrap();

        assert_eq!(updated.base_limit(Operation::UrlAnalysis), 1);
        // Replaced wholesale: no general fallback left in the new table
        assert_eq!(updated.base_limit(Operation::TextAnalysis), 0);
        assert_eq!(updated.global_limit(Operation::TextAnalysis), 100);

        assert!(ledger.check("a", Operation::UrlAnalysis).allowed);
        assert!(!ledger.check("a", Operation::UrlAnalysis).allowed);
        assert!(!ledger.check("a", Operation::TextAnalysis).allowed);
    }

    #[test]
    fn test_update_limits_rejects_zero_multiplier() {
        let (mut ledger, _) = ledger_with(QuotaConfig::default());

        assert!(ledger.update_limits(None, None, Some(0)).is_err());
        assert_eq!(ledger.config().vip_multiplier, 5);
    }

    #[test]
    fn test_sweep_removes_idle_subjects() {
        let (mut ledger, clock) = ledger_with(limits(5, 100));

        ledger.check("old", Operation::General);
        ledger.check("old", Operation::TextAnalysis);
        clock.advance_secs(45);
        ledger.check("recent", Operation::General);
        clock.advance_secs(30);

        let report = ledger.sweep();
        assert_eq!(report.removed_subjects, 1);
        // Two subject stamps and two global stamps from "old"
        assert_eq!(report.pruned, 4);
        let stats = ledger.global_stats();
        assert_eq!(stats.tracked_subjects, 1);
        assert_eq!(stats.active_subjects, 1);
        assert_eq!(ledger.subject_stats("old").total_requests, 0);
        assert_eq!(ledger.subject_stats("recent").operations[&Operation::General].current, 1);
    }

    #[test]
    fn test_global_stats() {
        let (mut ledger, _) = ledger_with(QuotaConfig::default());
        ledger.add_vip("boss");

        ledger.check("a", Operation::TextAnalysis);
        ledger.check("b", Operation::TextAnalysis);
        ledger.check("b", Operation::General);

        let stats = ledger.global_stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.blocked_requests, 0);
        assert_eq!(stats.active_subjects, 2);
        assert_eq!(stats.vip_count, 1);
        assert_eq!(
            stats.operations[&Operation::TextAnalysis],
            GlobalOperationUsage { limit: 100, current: 2, remaining: 98, total_requests: 2 }
        );
    }

    #[test]
    fn test_subject_stats_for_unknown_subject() {
        let (ledger, _) = ledger_with(QuotaConfig::default());

        let stats = ledger.subject_stats("ghost");
        assert!(!stats.is_vip);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.operations.len(), 4);
        assert_eq!(stats.operations[&Operation::TextAnalysis].remaining, 10);
    }
}
