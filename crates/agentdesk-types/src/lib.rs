//! Shared domain types for agentdesk.
//!
//! Agents, conversations, messages, audit logs, users and roles, plus the
//! error enums every other crate maps into.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod agent;
pub mod config;
pub mod conversation;
pub mod error;
pub mod log;
pub mod model;
pub mod page;
pub mod user;
