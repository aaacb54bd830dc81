//! Shapes exchanged with the upstream chat-completion service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::MessageRole;

/// One entry of the outbound message sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Per-call overrides of the agent's generation parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOverrides {
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
}

/// Errors from a model invocation.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Network failure or non-2xx status from the upstream service.
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// The upstream replied 2xx but without `choices[0].message.content`.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The HTTP client itself could not be constructed.
    #[error("client error: {0}")]
    Client(String),
}
