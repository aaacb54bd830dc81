//! Axum router configuration with middleware.
//!
//! Middleware: CORS (any origin/method/header) and request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::error::AppError;
use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        // Agents
        .route(
            "/agents",
            get(handlers::agent::list_agents).post(handlers::agent::create_agent),
        )
        .route(
            "/agents/{id}",
            get(handlers::agent::get_agent)
                .put(handlers::agent::update_agent)
                .delete(handlers::agent::delete_agent),
        )
        .route("/agents/{id}/status", post(handlers::agent::change_status))
        .route("/agents/{id}/logs", get(handlers::agent::list_agent_logs))
        // Exchanges
        .route("/agents/{id}/chat", post(handlers::chat::chat))
        .route("/agents/{id}/invoke", post(handlers::chat::invoke))
        // Conversations
        .route(
            "/conversations/agents/{id}/conversations",
            get(handlers::conversation::list_conversations)
                .post(handlers::conversation::create_conversation),
        )
        .route(
            "/conversations/agents/{id}/conversations/{cid}/messages",
            get(handlers::conversation::list_messages).post(handlers::chat::send_message),
        )
        // Logs
        .route("/logs", get(handlers::log::list_logs))
        // Users
        .route(
            "/users",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        // Roles
        .route(
            "/roles",
            get(handlers::role::list_roles).post(handlers::role::create_role),
        )
        .route(
            "/roles/{id}",
            get(handlers::role::get_role)
                .put(handlers::role::update_role)
                .delete(handlers::role::delete_role),
        )
        .route(
            "/roles/{id}/users",
            get(handlers::role::list_role_users)
                .post(handlers::role::assign_users)
                .delete(handlers::role::remove_users),
        )
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /
async fn index() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "message": "Agent Management Platform API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Any unmatched route.
async fn not_found() -> AppError {
    AppError::NotFound("Resource not found".to_string())
}

/// GET /health
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
