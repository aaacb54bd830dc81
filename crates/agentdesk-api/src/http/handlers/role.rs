//! Role handlers, including role membership.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};

use agentdesk_types::user::{CreateRoleRequest, Role, RoleMembersRequest, UpdateRoleRequest};

use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::extractors::path::ApiPath;
use crate::http::extractors::query::{ApiQuery, PageQuery};
use crate::http::response::paginated;
use crate::state::AppState;

/// GET /roles
pub async fn list_roles(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.resolve(state.config.default_per_page, &state.config);
    let roles = state.role_service.list_roles(page).await?;
    Ok(Json(paginated("roles", roles)?))
}

/// POST /roles
pub async fn create_role(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateRoleRequest>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    let role = state.role_service.create_role(body).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// GET /roles/{id}
pub async fn get_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Role>, AppError> {
    Ok(Json(state.role_service.get_role(id).await?))
}

/// PUT /roles/{id}
pub async fn update_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateRoleRequest>,
) -> Result<Json<Role>, AppError> {
    Ok(Json(state.role_service.update_role(id, body).await?))
}

/// DELETE /roles/{id} -- 400 while users still hold the role.
pub async fn delete_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    state.role_service.delete_role(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /roles/{id}/users
pub async fn list_role_users(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.resolve(state.config.default_per_page, &state.config);
    let users = state.role_service.list_role_users(id, page).await?;
    Ok(Json(paginated("users", users)?))
}

/// POST /roles/{id}/users
pub async fn assign_users(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<RoleMembersRequest>,
) -> Result<Json<Value>, AppError> {
    let count = state.role_service.assign_users(id, body).await?;
    Ok(Json(json!({
        "message": format!("{count} users assigned to role successfully")
    })))
}

/// DELETE /roles/{id}/users
pub async fn remove_users(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<RoleMembersRequest>,
) -> Result<Json<Value>, AppError> {
    let count = state.role_service.remove_users(id, body).await?;
    Ok(Json(json!({
        "message": format!("{count} users removed from role successfully")
    })))
}
