//! Exchange endpoints: chat, invoke, and posting into an existing conversation.
//!
//! All three run the same exchange; they differ in request/response shape,
//! audit wording, and whether a missing `conversation_id` starts a new
//! conversation.

use axum::Json;
use axum::extract::State;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use agentdesk_core::chat::service::{ExchangeChannel, ExchangeRequest};
use agentdesk_types::agent::AgentId;
use agentdesk_types::model::GenerationOverrides;

use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::extractors::path::ApiPath;
use crate::state::AppState;

/// Body of `POST /agents/{id}/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub content: Option<String>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub message: &'static str,
    pub response: String,
    pub conversation_id: String,
}

/// Body of `POST /agents/{id}/invoke`.
#[derive(Debug, Deserialize)]
pub struct InvokeBody {
    pub input: Option<String>,
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub stream: bool,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct InvokeReply {
    pub success: bool,
    pub output: String,
    pub conversation_id: String,
    pub metadata: InvokeMetadata,
}

#[derive(Debug, Serialize)]
pub struct InvokeMetadata {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: i64,
    pub created_at: String,
}

/// Body of `POST /conversations/agents/{id}/conversations/{cid}/messages`.
#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageReply {
    pub message: &'static str,
    pub response: String,
}

const SENT: &str = "Message sent successfully";

/// POST /agents/{id}/chat
pub async fn chat(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<ChatBody>,
) -> Result<Json<ChatReply>, AppError> {
    let outcome = state
        .chat_service
        .exchange(
            AgentId(id),
            ExchangeRequest {
                channel: ExchangeChannel::Chat,
                content: body.content,
                conversation_id: body.conversation_id,
                overrides: GenerationOverrides::default(),
            },
        )
        .await?;

    Ok(Json(ChatReply {
        message: SENT,
        response: outcome.reply,
        conversation_id: outcome.conversation.conversation_id,
    }))
}

/// POST /agents/{id}/invoke
pub async fn invoke(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<InvokeBody>,
) -> Result<Json<InvokeReply>, AppError> {
    if body.stream {
        return Err(AppError::Validation(
            "Streaming responses are not supported".to_string(),
        ));
    }

    let outcome = state
        .chat_service
        .exchange(
            AgentId(id),
            ExchangeRequest {
                channel: ExchangeChannel::Invoke,
                content: body.input,
                conversation_id: body.conversation_id,
                overrides: GenerationOverrides {
                    temperature: body.temperature,
                    max_tokens: body.max_tokens,
                },
            },
        )
        .await?;

    Ok(Json(InvokeReply {
        success: true,
        output: outcome.reply,
        conversation_id: outcome.conversation.conversation_id,
        metadata: InvokeMetadata {
            agent_id: outcome.agent.id,
            agent_name: outcome.agent.name,
            model_name: outcome.agent.model_name,
            temperature: outcome.temperature,
            max_tokens: outcome.max_tokens,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        },
    }))
}

/// POST /conversations/agents/{id}/conversations/{cid}/messages
pub async fn send_message(
    State(state): State<AppState>,
    ApiPath((id, conversation_id)): ApiPath<(i64, String)>,
    ApiJson(body): ApiJson<MessageBody>,
) -> Result<Json<MessageReply>, AppError> {
    let outcome = state
        .chat_service
        .exchange(
            AgentId(id),
            ExchangeRequest {
                channel: ExchangeChannel::Conversation,
                content: body.content,
                conversation_id: Some(conversation_id),
                overrides: GenerationOverrides::default(),
            },
        )
        .await?;

    Ok(Json(MessageReply {
        message: SENT,
        response: outcome.reply,
    }))
}
