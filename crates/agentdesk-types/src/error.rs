use thiserror::Error;

use crate::model::ModelError;

/// Errors related to agent management.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent not found")]
    NotFound,

    #[error("agent '{0}' already exists")]
    NameConflict(String),

    #[error("{0}")]
    InvalidStatus(String),

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from a chat exchange or conversation operation.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("agent not found")]
    AgentNotFound,

    #[error("conversation '{0}' not found")]
    ConversationNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Model API error: {0}")]
    Upstream(String),

    #[error("Model API error: {0}")]
    MalformedResponse(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ModelError> for ExchangeError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Upstream { message, .. } => ExchangeError::Upstream(message),
            ModelError::MalformedResponse(msg) => {
                ExchangeError::MalformedResponse(format!("malformed response: {msg}"))
            }
            ModelError::Client(msg) => ExchangeError::Internal(msg),
        }
    }
}

impl From<RepositoryError> for ExchangeError {
    fn from(e: RepositoryError) -> Self {
        ExchangeError::Storage(e.to_string())
    }
}

/// Errors related to user management.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors related to role management.
#[derive(Debug, Error)]
pub enum RoleError {
    #[error("role not found")]
    NotFound,

    #[error("role '{0}' already exists")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Role has associated users, cannot delete")]
    HasUsers,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from repository operations (used by trait definitions in agentdesk-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
