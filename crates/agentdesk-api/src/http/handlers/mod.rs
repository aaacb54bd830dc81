//! HTTP request handlers for the REST API.

pub mod agent;
pub mod chat;
pub mod conversation;
pub mod log;
pub mod role;
pub mod user;
