//! Transport adaptation: maps participant events onto engine calls and
//! engine results onto unicast / broadcast messages.
//!
//! Each function takes the engine lock once, does all of its engine work
//! under it, and publishes any broadcast before releasing it so that bus
//! order matches apply order.

use std::sync::Arc;

use cg_engine::{EligibilityReport, SessionId, WriteError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    api_types::{UpdateCellRequest, UpdateCellResponse},
    state::{now_millis, AppState, BusMsg},
};

/// A freshly registered participant and the messages owed to it alone.
#[derive(Debug)]
pub struct Connected {
    pub session_id: SessionId,
    pub initial: Vec<BusMsg>,
}

/// Register a new session and broadcast the new player count.
///
/// Subscribe to the bus *before* calling this if the new participant should
/// see its own `player_count` broadcast.
pub async fn connect(st: &AppState) -> Connected {
    let session_id = SessionId::new(Uuid::new_v4().to_string());
    let now = now_millis();

    let (grid, eligibility, count) = {
        let mut eng = st.engine.write().await;
        eng.add_session(&session_id);
        let grid = eng.grid();
        let eligibility = eng.check_eligibility(&session_id, now);
        let count = eng.session_count();
        let _ = st.bus.send(BusMsg::PlayerCount { count });
        (grid, eligibility, count)
    };

    info!(session_id = %session_id, players = count, "session connected");

    Connected {
        initial: vec![
            BusMsg::Welcome {
                session_id: session_id.clone(),
            },
            BusMsg::Grid { grid },
            BusMsg::Eligibility(eligibility),
        ],
        session_id,
    }
}

/// Drop a session and broadcast the new player count.
pub async fn disconnect(st: &AppState, session_id: &SessionId) {
    let count = {
        let mut eng = st.engine.write().await;
        if !eng.remove_session(session_id) {
            return;
        }
        let count = eng.session_count();
        let _ = st.bus.send(BusMsg::PlayerCount { count });
        count
    };
    info!(session_id = %session_id, players = count, "session disconnected");
}

/// Attempt a cell write on behalf of `session_id`.
///
/// On success the update is broadcast to everyone and the sender's new
/// eligibility is returned. Failures are returned to the caller only.
pub async fn update_cell(
    st: &AppState,
    session_id: &SessionId,
    req: &UpdateCellRequest,
) -> Result<UpdateCellResponse, WriteError> {
    let now = now_millis();

    let result = {
        let mut eng = st.engine.write().await;
        eng.attempt_write(req.row, req.col, &req.value, session_id, now)
            .map(|update| {
                let eligibility = eng.check_eligibility(session_id, update.timestamp);
                let _ = st.bus.send(BusMsg::CellUpdated(update.clone()));
                UpdateCellResponse {
                    update,
                    eligibility,
                }
            })
    };

    match &result {
        Ok(resp) => info!(
            session_id = %session_id,
            row = resp.update.row,
            col = resp.update.col,
            ts = resp.update.timestamp,
            "cell updated"
        ),
        Err(e) => debug!(session_id = %session_id, code = e.code(), "cell update rejected"),
    }
    result
}

/// Eligibility for a known session; `None` if the id is not registered.
pub async fn eligibility(st: &AppState, session_id: &SessionId) -> Option<EligibilityReport> {
    let mut eng = st.engine.write().await;
    if !eng.has_session(session_id) {
        return None;
    }
    Some(eng.check_eligibility(session_id, now_millis()))
}

/// Removes its session when dropped (i.e. when the SSE stream closes).
pub struct SessionGuard {
    st: Arc<AppState>,
    session_id: SessionId,
}

impl SessionGuard {
    pub fn new(st: Arc<AppState>, session_id: SessionId) -> Self {
        Self { st, session_id }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let st = Arc::clone(&self.st);
        let session_id = self.session_id.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    disconnect(&st, &session_id).await;
                });
            }
            Err(_) => warn!(session_id = %self.session_id, "no runtime at disconnect; session left registered"),
        }
    }
}
