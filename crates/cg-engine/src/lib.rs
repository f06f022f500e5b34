//! cg-engine
//!
//! Authoritative state engine for the shared character grid.
//!
//! Owns three pieces of state:
//! - the live N×N grid of cells
//! - the per-session eligibility table (cooldown or one-shot)
//! - the append-only, time-grouped history log
//!
//! Pure deterministic logic. No IO, no wall-clock. The caller supplies
//! `now_ms` on every time-dependent call and is responsible for running
//! operations one at a time (the daemon wraps the engine in a lock).

mod engine;
mod error;
mod grid;
mod history;
mod session;
mod types;

pub use engine::{EngineConfig, GridEngine};
pub use error::WriteError;
pub use grid::Grid;
pub use history::HistoryLog;
pub use session::{CooldownPolicy, Eligibility, EligibilityReport, SessionTable};
pub use types::*;
