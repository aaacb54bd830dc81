//! HTTP/REST API layer for agentdesk.
//!
//! Plain JSON bodies (no envelope), `{"error", "code"}` on failure, CORS
//! open to any origin.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
