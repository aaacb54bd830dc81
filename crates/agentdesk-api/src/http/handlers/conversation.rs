//! Conversation listing, explicit creation, and message history.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};

use agentdesk_types::agent::AgentId;
use agentdesk_types::conversation::Conversation;

use crate::http::error::AppError;
use crate::http::extractors::path::ApiPath;
use crate::state::AppState;

/// GET /conversations/agents/{id}/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, AppError> {
    let conversations = state.chat_service.list_conversations(AgentId(id)).await?;
    Ok(Json(json!({ "conversations": conversations })))
}

/// POST /conversations/agents/{id}/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<(StatusCode, Json<Conversation>), AppError> {
    let conversation = state.chat_service.create_conversation(AgentId(id)).await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// GET /conversations/agents/{id}/conversations/{cid}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    ApiPath((id, conversation_id)): ApiPath<(i64, String)>,
) -> Result<Json<Value>, AppError> {
    let messages = state
        .chat_service
        .list_messages(AgentId(id), &conversation_id)
        .await?;
    Ok(Json(json!({ "messages": messages })))
}
