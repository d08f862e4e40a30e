//! Request and Response models for the admission layer API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    CacheKeyRequest, CacheSetRequest, ClearQuery, GateAdmitRequest, GateRememberRequest,
    QuotaCheckRequest, ResetRequest, UpdateLimitsRequest,
};
pub use responses::{
    AdmitResponse, ClearResponse, ErrorResponse, HealthResponse, InvalidateResponse,
    LookupResponse, ResetResponse, StatsResponse, StoreResponse, VipResponse,
};
