/// Rejection reasons for a cell write.
///
/// All variants are expected, recoverable validation outcomes. The engine
/// returns them as values; presentation is the caller's decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteError {
    /// Row or column outside `0..N`.
    InvalidCoordinates { row: i64, col: i64 },
    /// Value is not exactly one character.
    InvalidValue,
    /// Session is cooling down; whole seconds remaining, rounded up.
    Cooldown { remaining_secs: i64 },
    /// One-shot mode and the session already wrote.
    AlreadySubmitted,
    /// No such session registered.
    UnknownSession,
    /// Target cell is currently owned by the writing session.
    CannotModifyOwnCell,
}

impl WriteError {
    /// Stable machine-readable code for the wire.
    pub fn code(&self) -> &'static str {
        match self {
            WriteError::InvalidCoordinates { .. } => "invalid_coordinates",
            WriteError::InvalidValue => "invalid_value",
            WriteError::Cooldown { .. } => "cooldown",
            WriteError::AlreadySubmitted => "already_submitted",
            WriteError::UnknownSession => "unknown_session",
            WriteError::CannotModifyOwnCell => "cannot_modify_own_cell",
        }
    }
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::InvalidCoordinates { row, col } => {
                write!(f, "invalid cell coordinates ({row}, {col})")
            }
            WriteError::InvalidValue => f.write_str("value must be a single character"),
            WriteError::Cooldown { remaining_secs } => write!(
                f,
                "you must wait {remaining_secs} seconds before updating again"
            ),
            WriteError::AlreadySubmitted => f.write_str("you have already submitted a cell"),
            WriteError::UnknownSession => f.write_str("unknown session"),
            WriteError::CannotModifyOwnCell => f.write_str("you cannot modify your own cell"),
        }
    }
}

impl std::error::Error for WriteError {}
