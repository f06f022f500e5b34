use serde::{Deserialize, Serialize};

use crate::{
    CellUpdate, CooldownPolicy, Eligibility, EligibilityReport, Grid, HistoryEntry, HistoryLog,
    SessionId, SessionTable, TimestampMs, WriteError,
};

/// Engine parameters, fixed for the lifetime of a [`GridEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub grid_size: usize,
    pub cooldown: CooldownPolicy,
    pub grouping_window_ms: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            cooldown: CooldownPolicy::default(),
            grouping_window_ms: 1_000,
        }
    }
}

/// The authoritative grid state: live cells, sessions, and the history log.
///
/// Every method runs to completion and leaves the state consistent; callers
/// serialize access (one `&mut self` at a time). Invariant maintained by
/// [`GridEngine::attempt_write`]: replaying `history()` onto an empty grid
/// reproduces `grid()`.
#[derive(Clone, Debug)]
pub struct GridEngine {
    cfg: EngineConfig,
    grid: Grid,
    sessions: SessionTable,
    history: HistoryLog,
}

impl GridEngine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            grid: Grid::new(cfg.grid_size),
            sessions: SessionTable::new(),
            history: HistoryLog::new(cfg.grouping_window_ms),
            cfg,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Register a session as eligible. Idempotent; returns `true` if new.
    pub fn add_session(&mut self, id: &SessionId) -> bool {
        self.sessions.add(id)
    }

    /// Forget a session. Grid and history are untouched.
    pub fn remove_session(&mut self, id: &SessionId) -> bool {
        self.sessions.remove(id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn has_session(&self, id: &SessionId) -> bool {
        self.sessions.contains(id)
    }

    /// Eligibility query. May move a `Cooling` session back to `Eligible`.
    pub fn check_eligibility(&mut self, id: &SessionId, now: TimestampMs) -> EligibilityReport {
        EligibilityReport::from_state(self.sessions.check(id, now))
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    /// Validate and apply a single-cell write.
    ///
    /// Checks run in order and stop at the first failure: bounds, value
    /// shape, session eligibility, self-overwrite. On success the cell, the
    /// history log, and the session state all change before returning.
    pub fn attempt_write(
        &mut self,
        row: i64,
        col: i64,
        value: &str,
        session: &SessionId,
        now: TimestampMs,
    ) -> Result<CellUpdate, WriteError> {
        let (r, c) = self
            .grid
            .checked_index(row, col)
            .ok_or(WriteError::InvalidCoordinates { row, col })?;

        let ch = single_char(value).ok_or(WriteError::InvalidValue)?;

        match self.sessions.check(session, now) {
            None => return Err(WriteError::UnknownSession),
            Some(Eligibility::Eligible) => {}
            Some(Eligibility::Cooling { until }) => {
                return Err(WriteError::Cooldown {
                    remaining_secs: remaining_secs(until, now),
                })
            }
            Some(Eligibility::Exhausted) => return Err(WriteError::AlreadySubmitted),
        }

        let owned_by_writer = self
            .grid
            .get(r, c)
            .and_then(|cell| cell.owner_id.as_ref())
            .is_some_and(|owner| owner == session);
        if owned_by_writer {
            return Err(WriteError::CannotModifyOwnCell);
        }

        // Never stamp earlier than the log tail, even if the caller's clock
        // stepped backwards; replay order depends on it.
        let timestamp = match self.history.latest_timestamp() {
            Some(latest) => now.max(latest),
            None => now,
        };

        let update = CellUpdate {
            row: r,
            col: c,
            value: ch,
            session_id: session.clone(),
            timestamp,
        };

        // Log first: the grid never holds a write the history lacks.
        self.history.append(update.clone());
        self.grid.apply(&update);
        self.sessions.record_write(session, self.cfg.cooldown, timestamp);

        Ok(update)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Snapshot of the live grid (owned copy; later writes do not affect it).
    pub fn grid(&self) -> Grid {
        self.grid.clone()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.all()
    }

    /// Reconstruct the grid as of `t` by replaying the log onto an empty grid.
    ///
    /// Update timestamps are non-decreasing across the log and each anchor is
    /// its entry's first timestamp, so stopping at the first update stamped
    /// after `t` skips every entry anchored after `t`, and applies a grouped
    /// entry that straddles `t` only up to `t`.
    pub fn grid_at_time(&self, t: TimestampMs) -> Grid {
        let mut grid = Grid::new(self.cfg.grid_size);
        for update in self.history.updates().take_while(|u| u.timestamp <= t) {
            grid.apply(update);
        }
        grid
    }
}

fn single_char(value: &str) -> Option<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Whole seconds until `until`, rounded up.
fn remaining_secs(until: TimestampMs, now: TimestampMs) -> i64 {
    let ms = until.saturating_sub(now).max(0);
    ms / 1_000 + i64::from(ms % 1_000 != 0)
}
