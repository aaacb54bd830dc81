//! Infrastructure layer for agentdesk.
//!
//! Implementations of the repository traits defined in `agentdesk-core`
//! (SQLite), the HTTP chat-completions model client, Argon2 password
//! hashing, and configuration loading.

pub mod config;
pub mod crypto;
pub mod llm;
pub mod sqlite;
