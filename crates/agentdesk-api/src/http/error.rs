//! Application error type mapping to HTTP status codes.
//!
//! Every failure body is `{"error": "<message>", "code": "<CODE>"}`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use agentdesk_types::error::{AgentError, ExchangeError, RoleError, UserError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Agent(AgentError),
    Exchange(ExchangeError),
    User(UserError),
    Role(RoleError),
    /// Request-shape problems caught before any service call.
    Validation(String),
    /// No route matched.
    NotFound(String),
    Internal(String),
}

impl From<AgentError> for AppError {
    fn from(e: AgentError) -> Self {
        AppError::Agent(e)
    }
}

impl From<ExchangeError> for AppError {
    fn from(e: ExchangeError) -> Self {
        AppError::Exchange(e)
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        AppError::User(e)
    }
}

impl From<RoleError> for AppError {
    fn from(e: RoleError) -> Self {
        AppError::Role(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid JSON body: {}", e.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        AppError::Validation(format!("Invalid path parameter: {}", e.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::Validation(format!("Invalid query string: {}", e.body_text()))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(format!("failed to serialize response: {e}"))
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        let validation = |msg: &String| (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone());
        let internal = |msg: String| (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg);

        match self {
            AppError::Agent(AgentError::NotFound) => {
                (StatusCode::NOT_FOUND, "AGENT_NOT_FOUND", "Agent not found".to_string())
            }
            AppError::Agent(AgentError::NameConflict(name)) => (
                StatusCode::CONFLICT,
                "AGENT_CONFLICT",
                format!("Agent with name \"{name}\" already exists"),
            ),
            AppError::Agent(AgentError::InvalidStatus(msg) | AgentError::Validation(msg)) => {
                validation(msg)
            }
            AppError::Agent(e @ AgentError::Storage(_)) => internal(e.to_string()),

            AppError::Exchange(ExchangeError::AgentNotFound) => {
                (StatusCode::NOT_FOUND, "AGENT_NOT_FOUND", "Agent not found".to_string())
            }
            AppError::Exchange(ExchangeError::ConversationNotFound(_)) => (
                StatusCode::NOT_FOUND,
                "CONVERSATION_NOT_FOUND",
                "Conversation not found".to_string(),
            ),
            AppError::Exchange(ExchangeError::Validation(msg)) => validation(msg),
            AppError::Exchange(e @ ExchangeError::Upstream(_)) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", e.to_string())
            }
            AppError::Exchange(e @ ExchangeError::MalformedResponse(_)) => {
                (StatusCode::BAD_GATEWAY, "MALFORMED_RESPONSE", e.to_string())
            }
            AppError::Exchange(e) => internal(e.to_string()),

            AppError::User(UserError::NotFound) => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND", "User not found".to_string())
            }
            AppError::User(UserError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "USER_CONFLICT", msg.clone())
            }
            AppError::User(UserError::Validation(msg)) => validation(msg),
            AppError::User(e) => internal(e.to_string()),

            AppError::Role(RoleError::NotFound) => {
                (StatusCode::NOT_FOUND, "ROLE_NOT_FOUND", "Role not found".to_string())
            }
            AppError::Role(e @ RoleError::Conflict(_)) => {
                (StatusCode::CONFLICT, "ROLE_CONFLICT", e.to_string())
            }
            AppError::Role(e @ RoleError::HasUsers) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Role(RoleError::Validation(msg)) => validation(msg),
            AppError::Role(e) => internal(e.to_string()),

            AppError::Validation(msg) => validation(msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Internal(msg) => internal(msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(%code, error = %message, "Request failed");
        }
        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}
