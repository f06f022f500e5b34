//! Shared runtime state for cg-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The grid engine is the
//! single owned state object; it lives behind one `RwLock` so that every
//! mutation (including eligibility checks, which may expire a cooldown) runs
//! alone, while snapshot reads may overlap each other.

use std::sync::Arc;
use std::time::Duration;

use cg_config::GridConfig;
use cg_engine::{
    CellUpdate, CooldownPolicy, EligibilityReport, EngineConfig, Grid, GridEngine, SessionId,
    TimestampMs,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};

// ---------------------------------------------------------------------------
// BusMsg: SSE event payloads
// ---------------------------------------------------------------------------

/// Everything a connected participant can receive over `/v1/stream`.
///
/// `Welcome`, `Grid` and `Eligibility` are unicast at connect time; the rest
/// go out on the broadcast bus to every subscriber.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Welcome { session_id: SessionId },
    Grid { grid: Grid },
    Eligibility(EligibilityReport),
    CellUpdated(CellUpdate),
    PlayerCount { count: usize },
    Heartbeat { ts_millis: i64 },
}

impl BusMsg {
    /// SSE `event:` name.
    pub fn event_name(&self) -> &'static str {
        match self {
            BusMsg::Welcome { .. } => "welcome",
            BusMsg::Grid { .. } => "grid",
            BusMsg::Eligibility(_) => "eligibility",
            BusMsg::CellUpdated(_) => "cell_updated",
            BusMsg::PlayerCount { .. } => "player_count",
            BusMsg::Heartbeat { .. } => "heartbeat",
        }
    }
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    /// The authoritative grid engine.
    pub engine: Arc<RwLock<GridEngine>>,
    pub config_hash: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AppState {
    pub fn new(cfg: EngineConfig) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        Self {
            bus,
            build: BuildInfo {
                service: "cg-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            engine: Arc::new(RwLock::new(GridEngine::new(cfg))),
            config_hash: None,
        }
    }

    pub fn with_config_hash(mut self, hash: String) -> Self {
        self.config_hash = Some(hash);
        self
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn engine_config(cfg: &GridConfig) -> EngineConfig {
    EngineConfig {
        grid_size: cfg.grid_size,
        cooldown: if cfg.cooldown_enabled {
            CooldownPolicy::Timed {
                duration_ms: cfg.cooldown_ms,
            }
        } else {
            CooldownPolicy::OneShot
        },
        grouping_window_ms: cfg.grouping_window_ms,
    }
}

/// Wall-clock milliseconds. The only place the daemon reads the clock for
/// engine calls.
pub fn now_millis() -> TimestampMs {
    chrono::Utc::now().timestamp_millis()
}

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let _ = bus.send(BusMsg::Heartbeat {
                ts_millis: now_millis(),
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_when_cooldown_disabled() {
        let cfg = GridConfig {
            cooldown_enabled: false,
            ..GridConfig::default()
        };
        assert_eq!(engine_config(&cfg).cooldown, CooldownPolicy::OneShot);
        assert_eq!(
            engine_config(&GridConfig::default()),
            EngineConfig::default()
        );
    }

    #[test]
    fn bus_msg_is_tagged_by_type() {
        let v = serde_json::to_value(BusMsg::PlayerCount { count: 3 }).unwrap();
        assert_eq!(v["type"], "player_count");
        assert_eq!(v["count"], 3);

        let v = serde_json::to_value(BusMsg::Grid { grid: Grid::new(2) }).unwrap();
        assert_eq!(v["type"], "grid");
        assert_eq!(v["grid"].as_array().unwrap().len(), 2);
    }
}
