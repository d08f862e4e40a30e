//! Quota Manager Module
//!
//! Thread-safe handle over [`QuotaLedger`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::clock::Clock;
use crate::error::Result;
use crate::quota::{
    AdmissionDecision, GlobalQuotaStats, LimitTable, Operation, QuotaConfig, QuotaLedger,
    QuotaSweepReport, SubjectQuotaStats,
};

// == Quota Manager ==
/// Cloneable handle to one ledger guarded by a single mutex.
///
/// Concurrent checks for the same subject are serialized, so two callers can
/// never both observe a free slot and both be admitted past the limit.
#[derive(Debug, Clone)]
pub struct QuotaManager {
    ledger: Arc<Mutex<QuotaLedger>>,
}

impl QuotaManager {
    pub fn new(config: QuotaConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(QuotaLedger::new(config, clock))),
        }
    }

    /// Evaluates and, on admission, records one request.
    pub fn check(&self, subject: &str, operation: Operation) -> AdmissionDecision {
        self.ledger.lock().check(subject, operation)
    }

    pub fn add_vip(&self, subject: &str) -> bool {
        self.ledger.lock().add_vip(subject)
    }

    pub fn remove_vip(&self, subject: &str) -> bool {
        self.ledger.lock().remove_vip(subject)
    }

    pub fn is_vip(&self, subject: &str) -> bool {
        self.ledger.lock().is_vip(subject)
    }

    pub fn reset_subject(&self, subject: &str, operation: Option<Operation>) {
        self.ledger.lock().reset_subject(subject, operation)
    }

    pub fn reset_global(&self, operation: Option<Operation>) {
        self.ledger.lock().reset_global(operation)
    }

    pub fn update_limits(
        &self,
        base_limits: Option<LimitTable>,
        global_limits: Option<LimitTable>,
        vip_multiplier: Option<u32>,
    ) -> Result<QuotaConfig> {
        self.ledger
            .lock()
            .update_limits(base_limits, global_limits, vip_multiplier)
    }

    pub fn config(&self) -> QuotaConfig {
        self.ledger.lock().config().clone()
    }

    pub fn subject_stats(&self, subject: &str) -> SubjectQuotaStats {
        self.ledger.lock().subject_stats(subject)
    }

    pub fn global_stats(&self) -> GlobalQuotaStats {
        self.ledger.lock().global_stats()
    }

    /// Runs one full sweep over every tracked window.
    pub fn sweep(&self) -> QuotaSweepReport {
        self.ledger.lock().sweep()
    }
}
