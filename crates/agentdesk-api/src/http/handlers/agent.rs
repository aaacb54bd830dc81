//! Agent CRUD, status and per-agent log handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use agentdesk_types::agent::{Agent, AgentId, CreateAgentRequest, UpdateAgentRequest};

use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::extractors::path::ApiPath;
use crate::http::extractors::query::{ApiQuery, PageQuery};
use crate::http::response::paginated;
use crate::state::AppState;

/// Body of `POST /agents/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: Option<String>,
}

/// GET /agents
pub async fn list_agents(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.resolve(state.config.default_per_page, &state.config);
    let agents = state.agent_service.list_agents(page).await?;
    Ok(Json(paginated("agents", agents)?))
}

/// POST /agents
pub async fn create_agent(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateAgentRequest>,
) -> Result<(StatusCode, Json<Agent>), AppError> {
    let agent = state.agent_service.create_agent(body).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

/// GET /agents/{id}
pub async fn get_agent(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Agent>, AppError> {
    Ok(Json(state.agent_service.get_agent(AgentId(id)).await?))
}

/// PUT /agents/{id}
pub async fn update_agent(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateAgentRequest>,
) -> Result<Json<Agent>, AppError> {
    Ok(Json(state.agent_service.update_agent(AgentId(id), body).await?))
}

/// DELETE /agents/{id}
pub async fn delete_agent(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    state.agent_service.delete_agent(AgentId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /agents/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<Agent>, AppError> {
    let agent = state
        .agent_service
        .change_status(AgentId(id), body.status.as_deref())
        .await?;
    Ok(Json(agent))
}

/// GET /agents/{id}/logs
pub async fn list_agent_logs(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.resolve(state.config.default_log_per_page, &state.config);
    let logs = state.agent_service.list_agent_logs(AgentId(id), page).await?;
    Ok(Json(paginated("logs", logs)?))
}
