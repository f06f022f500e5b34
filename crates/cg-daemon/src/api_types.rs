//! Request and response types for all cg-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests.  No business logic lives here.

use cg_engine::{CellUpdate, EligibilityReport, TimestampMs};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health  /v1/status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub players: usize,
    pub grid_size: usize,
    pub history_entries: usize,
    pub uptime_secs: u64,
    /// SHA-256 of the canonical config the daemon booted with, if loaded from YAML.
    pub config_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// /v1/grid/at
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridAtQuery {
    pub ts: TimestampMs,
}

// ---------------------------------------------------------------------------
// POST /v1/cells
// ---------------------------------------------------------------------------

/// Signed coordinates so out-of-range negatives reach the engine's bounds check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCellRequest {
    pub row: i64,
    pub col: i64,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCellResponse {
    pub update: CellUpdate,
    /// Sender's eligibility right after the write.
    pub eligibility: EligibilityReport,
}

/// Error body, unicast to the caller only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
