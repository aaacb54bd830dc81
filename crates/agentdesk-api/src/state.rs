//! Application state wiring all services together.
//!
//! Services are generic over repository/model/hasher traits; AppState pins
//! them to the concrete infra implementations.

use std::sync::Arc;

use agentdesk_core::chat::service::ChatService;
use agentdesk_core::service::agent::AgentService;
use agentdesk_core::service::role::RoleService;
use agentdesk_core::service::user::UserService;
use agentdesk_infra::crypto::password::Argon2PasswordHasher;
use agentdesk_infra::llm::chat_completions::ChatCompletionsClient;
use agentdesk_infra::sqlite::agent::SqliteAgentRepository;
use agentdesk_infra::sqlite::conversation::SqliteConversationRepository;
use agentdesk_infra::sqlite::log::SqliteAgentLogRepository;
use agentdesk_infra::sqlite::pool::DatabasePool;
use agentdesk_infra::sqlite::role::SqliteRoleRepository;
use agentdesk_infra::sqlite::user::SqliteUserRepository;
use agentdesk_types::config::ServerConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAgentService = AgentService<SqliteAgentRepository, SqliteAgentLogRepository>;

pub type ConcreteChatService = ChatService<
    SqliteAgentRepository,
    SqliteConversationRepository,
    SqliteAgentLogRepository,
    ChatCompletionsClient,
>;

pub type ConcreteUserService =
    UserService<SqliteUserRepository, SqliteRoleRepository, Argon2PasswordHasher>;

pub type ConcreteRoleService = RoleService<SqliteRoleRepository, SqliteUserRepository>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub agent_service: Arc<ConcreteAgentService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub user_service: Arc<ConcreteUserService>,
    pub role_service: Arc<ConcreteRoleService>,
    pub config: Arc<ServerConfig>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Wire every service onto an already-migrated pool.
    pub fn new(db_pool: DatabasePool, config: ServerConfig) -> anyhow::Result<Self> {
        let agents = SqliteAgentRepository::new(db_pool.clone());
        let logs = SqliteAgentLogRepository::new(db_pool.clone());
        let users = SqliteUserRepository::new(db_pool.clone());
        let roles = SqliteRoleRepository::new(db_pool.clone());

        let model = ChatCompletionsClient::new(config.upstream_timeout())?;

        let chat_service = ChatService::new(
            agents.clone(),
            SqliteConversationRepository::new(db_pool.clone()),
            logs.clone(),
            model,
        );

        Ok(Self {
            agent_service: Arc::new(AgentService::new(agents, logs)),
            chat_service: Arc::new(chat_service),
            user_service: Arc::new(UserService::new(
                users.clone(),
                roles.clone(),
                Argon2PasswordHasher::new(),
            )),
            role_service: Arc::new(RoleService::new(roles, users)),
            config: Arc::new(config),
            db_pool,
        })
    }
}
