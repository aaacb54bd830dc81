//! Global audit log listing.

use axum::Json;
use axum::extract::State;
use serde_json::Value;

use crate::http::error::AppError;
use crate::http::extractors::query::{ApiQuery, PageQuery};
use crate::http::response::paginated;
use crate::state::AppState;

/// GET /logs
pub async fn list_logs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.resolve(state.config.default_log_per_page, &state.config);
    let logs = state.agent_service.list_logs(page).await?;
    Ok(Json(paginated("logs", logs)?))
}
