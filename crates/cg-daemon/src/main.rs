//! cg-daemon entry point.
//!
//! Thin on purpose: it loads config, sets up tracing, builds the shared
//! state, wires middleware, and starts the HTTP server.  All route handlers
//! live in `routes.rs`; all shared state types live in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use cg_config::{report_unused_keys, GridConfig, UnusedKeyPolicy};
use cg_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3001);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let (grid_cfg, config_hash) = load_config()?;
    info!(
        grid_size = grid_cfg.grid_size,
        cooldown_enabled = grid_cfg.cooldown_enabled,
        cooldown_ms = grid_cfg.cooldown_ms,
        grouping_window_ms = grid_cfg.grouping_window_ms,
        config_hash = config_hash.as_deref().unwrap_or("builtin"),
        "config loaded"
    );

    let mut app_state = state::AppState::new(state::engine_config(&grid_cfg));
    if let Some(hash) = config_hash {
        app_state = app_state.with_config_hash(hash);
    }
    let shared = Arc::new(app_state);

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr_from_env()
        .or(grid_cfg.server_addr)
        .unwrap_or_else(|| SocketAddr::from(DEFAULT_ADDR));
    info!("cg-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// `CG_CONFIG` is a comma-separated list of YAML layers; without it the
/// built-in defaults apply.
fn load_config() -> anyhow::Result<(GridConfig, Option<String>)> {
    let Ok(raw) = std::env::var("CG_CONFIG") else {
        return Ok((GridConfig::default(), None));
    };
    let paths: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let loaded = cg_config::load_layered_yaml(&paths).context("loading CG_CONFIG layers")?;
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for key in &report.unused_leaf_pointers {
        warn!(key = %key, "unused config key");
    }
    let grid_cfg = loaded.grid_config()?;
    Ok((grid_cfg, Some(loaded.config_hash)))
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("CG_DAEMON_ADDR").ok()?.parse().ok()
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
