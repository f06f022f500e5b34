//! cg-daemon library target.
//!
//! Exposes the router, state, and transport adapter for integration tests.
//! The binary `main.rs` depends on this library target.

pub mod api_types;
pub mod routes;
pub mod state;
pub mod transport;
