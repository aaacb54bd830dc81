//! User account handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;

use agentdesk_types::user::{CreateUserRequest, UpdateUserRequest, User};

use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::extractors::path::ApiPath;
use crate::http::extractors::query::{ApiQuery, PageQuery};
use crate::http::response::paginated;
use crate::state::AppState;

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.resolve(state.config.default_per_page, &state.config);
    let users = state.user_service.list_users(page).await?;
    Ok(Json(paginated("users", users)?))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.user_service.create_user(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.user_service.get_user(id).await?))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.user_service.update_user(id, body).await?))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    state.user_service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
