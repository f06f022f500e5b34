//! Per-session write eligibility.
//!
//! # State machine
//!
//! ```text
//!   Timed cooldown:   Eligible ──write──► Cooling{until} ──check, now ≥ until──► Eligible
//!   One-shot:         Eligible ──write──► Exhausted (terminal)
//! ```
//!
//! - Entering `Cooling` / `Exhausted` only happens through [`SessionTable::record_write`].
//! - Leaving `Cooling` only happens through [`SessionTable::check`] (lazy expiry,
//!   no timers). The expiry rule itself is the pure [`Eligibility::expire`].
//! - Unknown ids are never created implicitly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{SessionId, TimestampMs};

/// What happens to a session after an accepted write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CooldownPolicy {
    /// Ineligible for `duration_ms` after each accepted write.
    Timed { duration_ms: i64 },
    /// One accepted write per session, ever.
    OneShot,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        CooldownPolicy::Timed { duration_ms: 60_000 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Cooling { until: TimestampMs },
    /// One-shot mode after the single write. **Terminal.**
    Exhausted,
}

impl Eligibility {
    /// Lazy expiry: `Cooling` whose deadline has been reached becomes `Eligible`.
    pub fn expire(self, now: TimestampMs) -> Self {
        match self {
            Eligibility::Cooling { until } if now >= until => Eligibility::Eligible,
            other => other,
        }
    }

    /// State entered after an accepted write at `ts`.
    pub fn after_write(policy: CooldownPolicy, ts: TimestampMs) -> Self {
        match policy {
            CooldownPolicy::Timed { duration_ms } => Eligibility::Cooling {
                until: ts.saturating_add(duration_ms),
            },
            CooldownPolicy::OneShot => Eligibility::Exhausted,
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }

    pub fn cooldown_until(&self) -> Option<TimestampMs> {
        match self {
            Eligibility::Cooling { until } => Some(*until),
            _ => None,
        }
    }
}

/// Wire view of a session's eligibility, as sent to the participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub can_update: bool,
    pub cooldown_until: Option<TimestampMs>,
}

impl EligibilityReport {
    /// Unknown sessions report ineligible with no cooldown info.
    pub fn from_state(state: Option<Eligibility>) -> Self {
        match state {
            Some(s) => Self {
                can_update: s.is_eligible(),
                cooldown_until: s.cooldown_until(),
            },
            None => Self {
                can_update: false,
                cooldown_until: None,
            },
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SessionTable {
    sessions: BTreeMap<SessionId, Eligibility>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert in `Eligible`. Returns `false` (and changes nothing) if present.
    pub fn add(&mut self, id: &SessionId) -> bool {
        if self.sessions.contains_key(id) {
            return false;
        }
        self.sessions.insert(id.clone(), Eligibility::Eligible);
        true
    }

    pub fn remove(&mut self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Stored state without applying expiry.
    pub fn get(&self, id: &SessionId) -> Option<Eligibility> {
        self.sessions.get(id).copied()
    }

    /// Eligibility query with the lazy-expiry side effect. `None` = unknown id.
    pub fn check(&mut self, id: &SessionId, now: TimestampMs) -> Option<Eligibility> {
        let state = self.sessions.get_mut(id)?;
        *state = state.expire(now);
        Some(*state)
    }

    /// Transition after an accepted write. No-op for unknown ids.
    pub fn record_write(&mut self, id: &SessionId, policy: CooldownPolicy, ts: TimestampMs) {
        if let Some(state) = self.sessions.get_mut(id) {
            *state = Eligibility::after_write(policy, ts);
        }
    }
}
