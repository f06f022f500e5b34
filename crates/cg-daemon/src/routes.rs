//! Axum router and all HTTP handlers for cg-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers.  Tests compose the bare router directly.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use cg_engine::{SessionId, WriteError};
use futures_util::{stream, Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::{
    api_types::{
        ErrorResponse, GridAtQuery, HealthResponse, StatusResponse, UpdateCellRequest,
    },
    state::{uptime_secs, AppState, BusMsg},
    transport::{self, SessionGuard},
};

/// Header carrying the session id minted by `/v1/stream`.
pub const SESSION_HEADER: &str = "x-session-id";

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/stream", get(stream_handler))
        .route("/v1/grid", get(grid))
        .route("/v1/grid/at", get(grid_at))
        .route("/v1/history", get(history))
        .route("/v1/sessions/:id/eligibility", get(eligibility))
        .route("/v1/cells", post(update_cell))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health  GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let eng = st.engine.read().await;
    let body = StatusResponse {
        players: eng.session_count(),
        grid_size: eng.config().grid_size,
        history_entries: eng.history().len(),
        uptime_secs: uptime_secs(),
        config_hash: st.config_hash.clone(),
    };
    (StatusCode::OK, Json(body))
}

// ---------------------------------------------------------------------------
// Grid / history reads
// ---------------------------------------------------------------------------

pub(crate) async fn grid(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = st.engine.read().await.grid();
    (StatusCode::OK, Json(snapshot))
}

pub(crate) async fn grid_at(
    State(st): State<Arc<AppState>>,
    Query(q): Query<GridAtQuery>,
) -> impl IntoResponse {
    let snapshot = st.engine.read().await.grid_at_time(q.ts);
    (StatusCode::OK, Json(snapshot))
}

pub(crate) async fn history(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let log = st.engine.read().await.history().to_vec();
    (StatusCode::OK, Json(log))
}

// ---------------------------------------------------------------------------
// GET /v1/sessions/:id/eligibility
// ---------------------------------------------------------------------------

pub(crate) async fn eligibility(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match transport::eligibility(&st, &SessionId::new(id)).await {
        Some(report) => (StatusCode::OK, Json(report)).into_response(),
        None => write_error_response(&WriteError::UnknownSession),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/cells
// ---------------------------------------------------------------------------

pub(crate) async fn update_cell(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<UpdateCellRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return (
                rejection.status(),
                Json(ErrorResponse {
                    error: rejection.body_text(),
                    code: "invalid_body".to_string(),
                }),
            )
                .into_response()
        }
    };

    let Some(session_id) = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(SessionId::new)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("missing {SESSION_HEADER} header"),
                code: "missing_session".to_string(),
            }),
        )
            .into_response();
    };

    match transport::update_cell(&st, &session_id, &req).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => write_error_response(&e),
    }
}

fn write_error_status(e: &WriteError) -> StatusCode {
    match e {
        WriteError::InvalidCoordinates { .. } | WriteError::InvalidValue => {
            StatusCode::BAD_REQUEST
        }
        WriteError::Cooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
        WriteError::AlreadySubmitted => StatusCode::FORBIDDEN,
        WriteError::UnknownSession => StatusCode::NOT_FOUND,
        WriteError::CannotModifyOwnCell => StatusCode::CONFLICT,
    }
}

fn write_error_response(e: &WriteError) -> Response {
    (
        write_error_status(e),
        Json(ErrorResponse {
            error: e.to_string(),
            code: e.code().to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

/// Connect: opening the stream registers a session; dropping it removes it.
pub(crate) async fn stream_handler(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let connected = transport::connect(&st).await;
    let guard = SessionGuard::new(Arc::clone(&st), connected.session_id);

    let initial = stream::iter(
        connected
            .initial
            .into_iter()
            .filter_map(|m| to_event(&m))
            .map(Ok::<Event, Infallible>),
    );
    let events = initial.chain(broadcast_to_sse(rx)).map(move |ev| {
        let _held = &guard;
        ev
    });

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn to_event(m: &BusMsg) -> Option<Event> {
    let data = serde_json::to_string(m).ok()?;
    Some(Event::default().event(m.event_name()).data(data))
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => to_event(&m).map(Ok),
            Err(_) => None, // lagged / closed
        }
    })
}
