use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch. Supplied by the runtime.
pub type TimestampMs = i64;

/// Opaque per-connection participant id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One grid cell. Every coordinate has one from initialization onwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// `None` until the first accepted write.
    pub value: Option<char>,
    pub owner_id: Option<SessionId>,
    pub last_write_at: TimestampMs,
}

/// Immutable record of one accepted write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    pub value: char,
    pub session_id: SessionId,
    pub timestamp: TimestampMs,
}

impl CellUpdate {
    /// The cell state this update leaves behind.
    pub fn to_cell(&self) -> Cell {
        Cell {
            value: Some(self.value),
            owner_id: Some(self.session_id.clone()),
            last_write_at: self.timestamp,
        }
    }
}

/// A time-grouped batch of accepted updates.
///
/// `anchor_timestamp` is always the timestamp of `updates[0]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub anchor_timestamp: TimestampMs,
    pub updates: Vec<CellUpdate>,
}
