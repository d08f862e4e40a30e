//! Admission Gate Module
//!
//! Composes the quota manager and the memo cache in front of an expensive
//! operation: check the quota, look the result up, and only on a miss run
//! the operation and remember its result.

use std::future::Future;

use serde_json::Value;
use tracing::debug;

use crate::cache::{Category, MemoCache};
use crate::quota::{AdmissionDecision, Operation, QuotaManager};

// == Gate Outcome ==
/// Result of one gated call.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Refused by the quota manager; the operation did not run
    Denied(AdmissionDecision),
    /// Served from the cache; the operation did not run
    Cached(Value),
    /// The operation ran; `stored` tells whether its result was cached
    Computed { value: Value, stored: bool },
}

impl GateOutcome {
    /// The value produced or served, if the call was admitted.
    pub fn value(&self) -> Option<&Value> {
        match self {
            GateOutcome::Denied(_) => None,
            GateOutcome::Cached(value) | GateOutcome::Computed { value, .. } => Some(value),
        }
    }
}

// == Admission ==
/// First half of a gated call, for callers that run the operation themselves
/// and report the result back through [`AdmissionGate::remember`].
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Refused by the quota manager
    Denied(AdmissionDecision),
    /// Admitted and already answered from the cache
    Cached(Value),
    /// Admitted with nothing cached; the caller runs the operation
    Proceed,
}

// == Admission Gate ==
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    quota: QuotaManager,
    cache: MemoCache,
    caching_enabled: bool,
    rate_limiting_enabled: bool,
}

impl AdmissionGate {
    pub fn new(quota: QuotaManager, cache: MemoCache) -> Self {
        Self {
            quota,
            cache,
            caching_enabled: true,
            rate_limiting_enabled: true,
        }
    }

    /// Turns the cache lookup and store steps on or off.
    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }

    /// Turns the quota check on or off.
    pub fn with_rate_limiting(mut self, enabled: bool) -> Self {
        self.rate_limiting_enabled = enabled;
        self
    }

    // == Admit ==
    /// Checks the quota for `subject`, then looks up `(category, content)`.
    ///
    /// A denial leaves the cache untouched.
    pub fn admit(
        &self,
        subject: &str,
        operation: Operation,
        category: Category,
        content: &Value,
    ) -> Admission {
        if self.rate_limiting_enabled {
            let decision = self.quota.check(subject, operation);
            if decision.is_denied() {
                return Admission::Denied(decision);
            }
        }

        if self.caching_enabled {
            if let Some(value) = self.cache.get(category, content) {
                debug!("Cache hit for {} request from {}", category, subject);
                return Admission::Cached(value);
            }
        }

        Admission::Proceed
    }

    // == Remember ==
    /// Stores the result of an admitted operation under its category TTL.
    ///
    /// Returns whether it was stored; always `false` with caching off.
    pub fn remember(&self, category: Category, content: &Value, value: Value) -> bool {
        self.caching_enabled && self.cache.set(category, content, value, None)
    }

    // == Call ==
    /// Runs `compute` for `subject` unless the quota refuses it or the
    /// result for `(category, content)` is already cached.
    ///
    /// An error from `compute` is returned unchanged and nothing is cached.
    pub async fn call<F, Fut, E>(
        &self,
        subject: &str,
        operation: Operation,
        category: Category,
        content: &Value,
        compute: F,
    ) -> std::result::Result<GateOutcome, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Value, E>>,
    {
        match self.admit(subject, operation, category, content) {
            Admission::Denied(decision) => Ok(GateOutcome::Denied(decision)),
            Admission::Cached(value) => Ok(GateOutcome::Cached(value)),
            Admission::Proceed => {
                let value = compute().await?;
                let stored = self.remember(category, content, value.clone());
                Ok(GateOutcome::Computed { value, stored })
            }
        }
    }

    pub fn quota(&self) -> &QuotaManager {
        &self.quota
    }

    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::clock::ManualClock;
    use crate::quota::{DecisionReason, LimitTable, QuotaConfig};
    use serde_json::json;
    use std::cell::Cell;
    use std::sync::Arc;
    use tokio_test::block_on;

    fn gate(user_limit: u32) -> AdmissionGate {
        let clock: Arc<ManualClock> = Arc::new(ManualClock::new(0));
        let quota_config = QuotaConfig {
            base_limits: LimitTable::from([(Operation::General, user_limit)]),
            global_limits: LimitTable::from([(Operation::General, 1_000)]),
            ..QuotaConfig::default()
        };
        AdmissionGate::new(
            QuotaManager::new(quota_config, clock.clone()),
            MemoCache::new(CacheConfig::with_limit_bytes(10_000), clock),
        )
    }

    #[test]
    fn test_miss_computes_then_hit_serves_cache() {
        let gate = gate(10);
        let runs = Cell::new(0);
        let runs_ref = &runs;
        let content = json!("is the moon made of cheese?");

        let compute = move || async move {
            runs_ref.set(runs_ref.get() + 1);
            Ok::<_, String>(json!("Credibility: 3%"))
        };

        let first = block_on(gate.call(
            "u1",
            Operation::TextAnalysis,
            Category::Analysis,
            &content,
            compute,
        ))
        .unwrap();
        assert_eq!(
            first,
            GateOutcome::Computed { value: json!("Credibility: 3%"), stored: true }
        );

        let second = block_on(gate.call(
            "u2",
            Operation::TextAnalysis,
            Category::Analysis,
            &content,
            compute,
        ))
        .unwrap();
        assert_eq!(second, GateOutcome::Cached(json!("Credibility: 3%")));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_denied_request_skips_cache_and_compute() {
        let gate = gate(1);
        let ran = Cell::new(false);
        let ran_ref = &ran;
        let content = json!("text");

        block_on(gate.call("u1", Operation::General, Category::Analysis, &content, || async {
            Ok::<_, String>(json!("report"))
        }))
        .unwrap();

        let outcome = block_on(gate.call(
            "u1",
            Operation::General,
            Category::Analysis,
            &content,
            move || async move {
                ran_ref.set(true);
                Ok::<_, String>(Value::Null)
            },
        ))
        .unwrap();

        match outcome {
            GateOutcome::Denied(decision) => {
                assert_eq!(decision.reason, DecisionReason::UserLimitExceeded)
            }
            other => panic!("expected denial, got {:?}", other),
        }
        assert!(!ran.get());
        // Only the first call reached the cache
        let stats = gate.cache().stats();
        assert_eq!(stats.hits + stats.misses, 1);
    }

    #[test]
    fn test_compute_error_is_not_cached() {
        let gate = gate(10);
        let content = json!("https://down.example");

        let result = block_on(gate.call(
            "u1",
            Operation::UrlAnalysis,
            Category::UrlContent,
            &content,
            || async { Err::<Value, _>("fetch failed".to_string()) },
        ));
        assert_eq!(result.unwrap_err(), "fetch failed");
        assert!(gate.cache().get(Category::UrlContent, &content).is_none());
    }

    #[test]
    fn test_disabled_switches() {
        let gate = gate(1).with_caching(false).with_rate_limiting(false);
        let content = json!("text");

        for _ in 0..3 {
            let outcome = block_on(gate.call(
                "u1",
                Operation::General,
                Category::Analysis,
                &content,
                || async { Ok::<_, String>(json!("report")) },
            ))
            .unwrap();
            assert_eq!(outcome, GateOutcome::Computed { value: json!("report"), stored: false });
            assert_eq!(outcome.value(), Some(&json!("report")));
        }
        assert_eq!(gate.cache().stats().total_entries, 0);
        assert_eq!(gate.quota().global_stats().total_requests, 0);
    }

    #[test]
    fn test_admit_then_remember() {
        let gate = gate(2);
        let content = json!("https://news.example/a");

        assert_eq!(
            gate.admit("u1", Operation::General, Category::UrlContent, &content),
            Admission::Proceed
        );
        assert!(gate.remember(Category::UrlContent, &content, json!("page")));
        assert_eq!(
            gate.admit("u1", Operation::General, Category::UrlContent, &content),
            Admission::Cached(json!("page"))
        );
        assert!(matches!(
            gate.admit("u1", Operation::General, Category::UrlContent, &content),
            Admission::Denied(_)
        ));
    }

    #[test]
    fn test_remember_with_caching_off() {
        let gate = gate(2).with_caching(false);
        let content = json!("text");

        assert!(!gate.remember(Category::Analysis, &content, json!("report")));
        assert_eq!(
            gate.admit("u1", Operation::General, Category::Analysis, &content),
            Admission::Proceed
        );
        assert_eq!(gate.cache().stats().total_entries, 0);
    }
}
