//! Quota Module
//!
//! Per-subject and global sliding-window rate limiting with per-operation
//! limits and a VIP multiplier.

mod config;
mod decision;
mod ledger;
mod manager;
mod operation;
mod stats;
mod window;


pub use config::{LimitTable, QuotaConfig};
pub use decision::{AdmissionDecision, DecisionReason};
pub use ledger::{QuotaLedger, QuotaSweepReport};
pub use manager::QuotaManager;
pub use operation::Operation;
pub use stats::{
    GlobalOperationUsage, GlobalQuotaStats, OperationUsage, SubjectCounters, SubjectQuotaStats,
};
pub use window::SlidingWindow;
