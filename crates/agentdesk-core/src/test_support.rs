//! In-memory repositories and a scripted chat model for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use agentdesk_types::agent::{
    Agent, AgentId, AgentStatus, DEFAULT_CONTEXT_WINDOW, DEFAULT_MAX_TOKENS, DEFAULT_MODEL_API_URL,
    DEFAULT_MODEL_NAME, DEFAULT_MODEL_PROVIDER, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P,
};
use agentdesk_types::conversation::{Conversation, Message, MessageRole, NewMessage};
use agentdesk_types::error::RepositoryError;
use agentdesk_types::log::{AgentLog, LogLevel};
use agentdesk_types::model::{ChatMessage, GenerationOverrides, ModelError};
use agentdesk_types::page::{Page, PageRequest};
use agentdesk_types::user::{NewUser, Role, User};
use chrono::Utc;

use crate::llm::provider::ChatModel;
use crate::repository::agent::AgentRepository;
use crate::repository::conversation::ConversationRepository;
use crate::repository::log::AgentLogRepository;
use crate::repository::role::RoleRepository;
use crate::repository::user::UserRepository;
use crate::service::hash::PasswordHasher;

#[derive(Default)]
struct Tables {
    agents: Vec<Agent>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    logs: Vec<AgentLog>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// One shared in-memory store implementing every agent-side repository.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

fn page_of<T: Clone>(mut rows: Vec<T>, page: PageRequest) -> Page<T> {
    rows.reverse();
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Page::new(items, total, page)
}

impl MemoryStore {
    pub async fn open_conversation(&self, agent: &Agent) -> Conversation {
        let id = agentdesk_types::conversation::new_conversation_id();
        ConversationRepository::create(self, agent.id, &id)
            .await
            .unwrap()
    }

    pub async fn push(&self, conversation: &Conversation, role: MessageRole, content: &str) {
        self.append_message(&NewMessage::now(conversation.id, role, content))
            .await
            .unwrap();
    }

    pub fn logs(&self) -> Vec<AgentLog> {
        self.tables.lock().unwrap().logs.clone()
    }

    pub fn conversation_count(&self) -> usize {
        self.tables.lock().unwrap().conversations.len()
    }
}

impl AgentRepository for MemoryStore {
    async fn create(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.agents.iter().any(|a| a.name == agent.name) {
            return Err(RepositoryError::Conflict(format!("agent '{}' exists", agent.name)));
        }
        let mut agent = agent.clone();
        agent.id = AgentId(tables.next_id());
        tables.agents.push(agent.clone());
        Ok(agent)
    }

    async fn get_by_id(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.agents.iter().find(|a| a.id == id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Agent>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.agents.iter().find(|a| a.name == name).cloned())
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Agent>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(page_of(tables.agents.clone(), page))
    }

    async fn update(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .agents
            .iter()
            .any(|a| a.name == agent.name && a.id != agent.id)
        {
            return Err(RepositoryError::Conflict(format!("agent '{}' exists", agent.name)));
        }
        let slot = tables
            .agents
            .iter_mut()
            .find(|a| a.id == agent.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = agent.clone();
        Ok(agent.clone())
    }

    async fn delete(&self, id: AgentId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.agents.len();
        tables.agents.retain(|a| a.id != id);
        if tables.agents.len() == before {
            return Err(RepositoryError::NotFound);
        }
        let owned: Vec<i64> = tables
            .conversations
            .iter()
            .filter(|c| c.agent_id == id)
            .map(|c| c.id)
            .collect();
        tables.messages.retain(|m| !owned.contains(&m.conversation_id));
        tables.conversations.retain(|c| c.agent_id != id);
        tables.logs.retain(|l| l.agent_id != id);
        Ok(())
    }
}

impl ConversationRepository for MemoryStore {
    async fn create(
        &self,
        agent_id: AgentId,
        conversation_id: &str,
    ) -> Result<Conversation, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let conversation = Conversation {
            id: tables.next_id(),
            agent_id,
            conversation_id: conversation_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn find(
        &self,
        agent_id: AgentId,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .conversations
            .iter()
            .find(|c| c.agent_id == agent_id && c.conversation_id == conversation_id)
            .cloned())
    }

    async fn list_for_agent(&self, agent_id: AgentId) -> Result<Vec<Conversation>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Conversation> = tables
            .conversations
            .iter()
            .filter(|c| c.agent_id == agent_id)
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn append_message(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let stored = Message {
            id: tables.next_id(),
            conversation_id: message.conversation_id,
            role: message.role,
            content: message.content.clone(),
            created_at: message.created_at,
        };
        tables.messages.push(stored.clone());
        Ok(stored)
    }

    async fn list_messages(&self, conversation: i64) -> Result<Vec<Message>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}

impl AgentLogRepository for MemoryStore {
    async fn append(
        &self,
        agent_id: AgentId,
        level: LogLevel,
        message: &str,
    ) -> Result<AgentLog, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let log = AgentLog {
            id: tables.next_id(),
            agent_id,
            level,
            message: message.to_string(),
            created_at: Utc::now(),
        };
        tables.logs.push(log.clone());
        Ok(log)
    }

    async fn list_for_agent(
        &self,
        agent_id: AgentId,
        page: PageRequest,
    ) -> Result<Page<AgentLog>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .logs
            .iter()
            .filter(|l| l.agent_id == agent_id)
            .cloned()
            .collect();
        Ok(page_of(rows, page))
    }

    async fn list_all(&self, page: PageRequest) -> Result<Page<AgentLog>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(page_of(tables.logs.clone(), page))
    }
}

/// Register an agent with default model settings.
pub async fn sample_agent(store: &MemoryStore, name: &str) -> Agent {
    let now = Utc::now();
    let agent = Agent {
        id: AgentId(0),
        name: name.to_string(),
        description: String::new(),
        status: AgentStatus::Inactive,
        model_name: DEFAULT_MODEL_NAME.to_string(),
        model_provider: DEFAULT_MODEL_PROVIDER.to_string(),
        model_api_url: DEFAULT_MODEL_API_URL.to_string(),
        model_api_key: None,
        model_temperature: DEFAULT_TEMPERATURE,
        model_max_tokens: DEFAULT_MAX_TOKENS,
        model_top_p: DEFAULT_TOP_P,
        model_top_k: DEFAULT_TOP_K,
        model_presence_penalty: 0.0,
        model_frequency_penalty: 0.0,
        model_stop_sequences: Vec::new(),
        model_context_window: DEFAULT_CONTEXT_WINDOW,
        model_system_prompt: None,
        created_at: now,
        updated_at: now,
    };
    AgentRepository::create(store, &agent).await.unwrap()
}

/// What the scripted model does on its next call.
pub enum Scripted {
    Reply(String),
    HttpError(u16),
    Malformed,
}

/// Chat model that replays canned outcomes and records what it was sent.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<(Vec<ChatMessage>, GenerationOverrides)>>>,
}

impl ScriptedModel {
    pub fn replying(replies: &[&str]) -> Self {
        let model = Self::default();
        for reply in replies {
            model.then(Scripted::Reply(reply.to_string()));
        }
        model
    }

    pub fn then(&self, outcome: Scripted) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<(Vec<ChatMessage>, GenerationOverrides)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        _agent: &Agent,
        messages: &[ChatMessage],
        overrides: GenerationOverrides,
    ) -> Result<String, ModelError> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), overrides));
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::HttpError(status)) => Err(ModelError::Upstream {
                status: Some(status),
                message: format!("HTTP {status}"),
            }),
            Some(Scripted::Malformed) => Err(ModelError::MalformedResponse(
                "missing choices[0].message.content".to_string(),
            )),
            None => Ok("default reply".to_string()),
        }
    }
}

#[derive(Default)]
struct Directory {
    users: Vec<(User, String)>,
    roles: Vec<Role>,
    memberships: Vec<(i64, i64)>,
    next_id: i64,
}

impl Directory {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn hydrate_user(&self, user: &User) -> User {
        let mut user = user.clone();
        let roles: Vec<&Role> = self
            .roles
            .iter()
            .filter(|r| self.memberships.contains(&(user.id, r.id)))
            .collect();
        user.role_ids = roles.iter().map(|r| r.id).collect();
        user.role_names = roles.iter().map(|r| r.name.clone()).collect();
        user
    }

    fn hydrate_role(&self, role: &Role) -> Role {
        let mut role = role.clone();
        role.user_count = self.memberships.iter().filter(|(_, r)| *r == role.id).count() as i64;
        role
    }

    fn attach(&mut self, user_id: i64, role_ids: &[i64]) {
        for role_id in role_ids {
            let known = self.roles.iter().any(|r| r.id == *role_id);
            if known && !self.memberships.contains(&(user_id, *role_id)) {
                self.memberships.push((user_id, *role_id));
            }
        }
    }
}

/// In-memory users, roles and memberships.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    tables: Arc<Mutex<Directory>>,
}

impl MemoryDirectory {
    pub fn password_hash(&self, user_id: i64) -> Option<String> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|(u, _)| u.id == user_id)
            .map(|(_, h)| h.clone())
    }
}

impl UserRepository for MemoryDirectory {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .users
            .iter()
            .any(|(u, _)| u.username == user.username || u.email == user.email)
        {
            return Err(RepositoryError::Conflict("user exists".to_string()));
        }
        let now = Utc::now();
        let stored = User {
            id: tables.next_id(),
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
            is_active: user.is_active,
            is_admin: user.is_admin,
            role_ids: Vec::new(),
            role_names: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push((stored.clone(), user.password_hash.clone()));
        tables.attach(stored.id, &user.role_ids);
        Ok(tables.hydrate_user(&stored))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| tables.hydrate_user(u)))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|(u, _)| u.username == username)
            .map(|(u, _)| tables.hydrate_user(u)))
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .filter(|(u, _)| u.username == username || u.email == email)
            .map(|(u, _)| tables.hydrate_user(u))
            .collect())
    }

    async fn list(&self, page: PageRequest) -> Result<Page<User>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .users
            .iter()
            .map(|(u, _)| tables.hydrate_user(u))
            .collect();
        Ok(page_of(rows, page))
    }

    async fn list_by_role(
        &self,
        role_id: i64,
        page: PageRequest,
    ) -> Result<Page<User>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .users
            .iter()
            .filter(|(u, _)| tables.memberships.contains(&(u.id, role_id)))
            .map(|(u, _)| tables.hydrate_user(u))
            .collect();
        Ok(page_of(rows, page))
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|(u, _)| {
            u.id != user.id && (u.username == user.username || u.email == user.email)
        }) {
            return Err(RepositoryError::Conflict("user exists".to_string()));
        }
        let slot = tables
            .users
            .iter_mut()
            .find(|(u, _)| u.id == user.id)
            .ok_or(RepositoryError::NotFound)?;
        slot.0 = user.clone();
        Ok(tables.hydrate_user(user))
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let slot = tables
            .users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        slot.1 = password_hash.to_string();
        Ok(())
    }

    async fn replace_roles(&self, id: i64, role_ids: &[i64]) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        tables.memberships.retain(|(u, _)| *u != id);
        tables.attach(id, role_ids);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.users.len();
        tables.users.retain(|(u, _)| u.id != id);
        if tables.users.len() == before {
            return Err(RepositoryError::NotFound);
        }
        tables.memberships.retain(|(u, _)| *u != id);
        Ok(())
    }
}

impl RoleRepository for MemoryDirectory {
    async fn create(&self, name: &str, description: &str) -> Result<Role, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.roles.iter().any(|r| r.name == name) {
            return Err(RepositoryError::Conflict(format!("role '{name}' exists")));
        }
        let now = Utc::now();
        let role = Role {
            id: tables.next_id(),
            name: name.to_string(),
            description: description.to_string(),
            user_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.roles.push(role.clone());
        Ok(role)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Role>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .roles
            .iter()
            .find(|r| r.id == id)
            .map(|r| tables.hydrate_role(r)))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .roles
            .iter()
            .find(|r| r.name == name)
            .map(|r| tables.hydrate_role(r)))
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Role>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let rows = tables.roles.iter().map(|r| tables.hydrate_role(r)).collect();
        Ok(page_of(rows, page))
    }

    async fn update(&self, role: &Role) -> Result<Role, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .roles
            .iter()
            .any(|r| r.id != role.id && r.name == role.name)
        {
            return Err(RepositoryError::Conflict(format!("role '{}' exists", role.name)));
        }
        let slot = tables
            .roles
            .iter_mut()
            .find(|r| r.id == role.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = role.clone();
        Ok(tables.hydrate_role(role))
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.roles.len();
        tables.roles.retain(|r| r.id != id);
        if tables.roles.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn add_users(&self, role_id: i64, user_ids: &[i64]) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let mut count = 0;
        for user_id in user_ids {
            if tables.users.iter().any(|(u, _)| u.id == *user_id) {
                tables.attach(*user_id, &[role_id]);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn remove_users(&self, role_id: i64, user_ids: &[i64]) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let mut count = 0;
        for user_id in user_ids {
            if tables.users.iter().any(|(u, _)| u.id == *user_id) {
                tables.memberships.retain(|m| *m != (*user_id, role_id));
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Reversible stand-in for argon2 so tests can inspect stored hashes.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, String> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash.strip_prefix("plain$") == Some(password)
    }
}
