//! agentdesk REST API: application state wiring and the axum HTTP layer.
//!
//! The `agentdesk` binary in `main.rs` adds the CLI on top.

pub mod http;
pub mod state;
