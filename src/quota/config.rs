//! Quota configuration: per-operation limits, VIP multiplier and window length.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};
use crate::quota::Operation;

/// Limits table keyed by operation.
pub type LimitTable = BTreeMap<Operation, u32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Requests per window for one normal subject
    pub base_limits: LimitTable,
    /// Requests per window across all subjects
    pub global_limits: LimitTable,
    /// Scales `base_limits` for VIP subjects; never applied to global limits
    pub vip_multiplier: u32,
    /// Sliding window length in seconds
    pub window_secs: u64,
}

impl QuotaConfig {
    /// Per-subject limit for `operation` before any VIP scaling.
    pub fn base_limit(&self, operation: Operation) -> u32 {
        lookup(&self.base_limits, operation)
    }

    pub fn global_limit(&self, operation: Operation) -> u32 {
        lookup(&self.global_limits, operation)
    }

    pub fn window_ms(&self) -> u64 {
        self.window_secs.saturating_mul(1000)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            return Err(GateError::InvalidRequest(
                "Quota window must be positive".to_string(),
            ));
        }
        if self.vip_multiplier == 0 {
            return Err(GateError::InvalidRequest(
                "VIP multiplier must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Missing operations fall back to the table's `general` entry, then to 0.
fn lookup(table: &LimitTable, operation: Operation) -> u32 {
    table
        .get(&operation)
        .or_else(|| table.get(&Operation::General))
        .copied()
        .unwrap_or(0)
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            base_limits: LimitTable::from([
                (Operation::TextAnalysis, 10),
                (Operation::UrlAnalysis, 5),
                (Operation::ImageAnalysis, 3),
                (Operation::General, 15),
            ]),
            global_limits: LimitTable::from([
                (Operation::TextAnalysis, 100),
                (Operation::UrlAnalysis, 50),
                (Operation::ImageAnalysis, 30),
                (Operation::General, 200),
            ]),
            vip_multiplier: 5,
            window_secs: 60,
        }
    }
}
