//! Agent management service.
//!
//! Registration, partial updates, status transitions and deletion, each
//! leaving an entry in the agent's audit log.

use agentdesk_types::agent::{
    Agent, AgentId, AgentStatus, CreateAgentRequest, DEFAULT_CONTEXT_WINDOW, DEFAULT_MAX_TOKENS,
    DEFAULT_MODEL_API_URL, DEFAULT_MODEL_NAME, DEFAULT_MODEL_PROVIDER, DEFAULT_TEMPERATURE,
    DEFAULT_TOP_K, DEFAULT_TOP_P, UpdateAgentRequest, validate_stop_sequences,
};
use agentdesk_types::error::{AgentError, RepositoryError};
use agentdesk_types::log::{AgentLog, LogLevel};
use agentdesk_types::page::{Page, PageRequest};
use chrono::Utc;
use tracing::{info, warn};

use crate::repository::agent::AgentRepository;
use crate::repository::log::AgentLogRepository;

fn storage(e: RepositoryError) -> AgentError {
    match e {
        RepositoryError::NotFound => AgentError::NotFound,
        other => AgentError::Storage(other.to_string()),
    }
}

fn parse_status(raw: &str) -> Result<AgentStatus, AgentError> {
    raw.parse::<AgentStatus>().map_err(AgentError::InvalidStatus)
}

fn required_name(raw: Option<String>) -> Result<String, AgentError> {
    raw.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AgentError::Validation("Agent name is required".to_string()))
}

fn check_stop_sequences(sequences: &[String]) -> Result<(), AgentError> {
    validate_stop_sequences(sequences).map_err(AgentError::Validation)
}

/// Service owning the agent lifecycle.
///
/// Generic over the repositories so the infra crate stays out of core.
pub struct AgentService<A: AgentRepository, L: AgentLogRepository> {
    agents: A,
    logs: L,
}

impl<A: AgentRepository, L: AgentLogRepository> AgentService<A, L> {
    pub fn new(agents: A, logs: L) -> Self {
        Self { agents, logs }
    }

    async fn audit(&self, agent: &Agent, message: String) {
        if let Err(e) = self.logs.append(agent.id, LogLevel::Info, &message).await {
            warn!(agent_id = %agent.id, error = %e, "Failed to write audit log entry");
        }
    }

    /// Register a new agent. Unspecified fields take their defaults.
    pub async fn create_agent(&self, request: CreateAgentRequest) -> Result<Agent, AgentError> {
        let name = required_name(request.name)?;
        let status = match request.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => AgentStatus::default(),
        };
        let stop_sequences = request.model_stop_sequences.unwrap_or_default();
        check_stop_sequences(&stop_sequences)?;

        let now = Utc::now();
        let agent = Agent {
            id: AgentId(0),
            name,
            description: request.description.unwrap_or_default(),
            status,
            model_name: request
                .model_name
                .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            model_provider: request
                .model_provider
                .unwrap_or_else(|| DEFAULT_MODEL_PROVIDER.to_string()),
            model_api_url: request
                .model_api_url
                .unwrap_or_else(|| DEFAULT_MODEL_API_URL.to_string()),
            model_api_key: request.model_api_key,
            model_temperature: request.model_temperature.unwrap_or(DEFAULT_TEMPERATURE),
            model_max_tokens: request.model_max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            model_top_p: request.model_top_p.unwrap_or(DEFAULT_TOP_P),
            model_top_k: request.model_top_k.unwrap_or(DEFAULT_TOP_K),
            model_presence_penalty: request.model_presence_penalty.unwrap_or(0.0),
            model_frequency_penalty: request.model_frequency_penalty.unwrap_or(0.0),
            model_stop_sequences: stop_sequences,
            model_context_window: request
                .model_context_window
                .unwrap_or(DEFAULT_CONTEXT_WINDOW),
            model_system_prompt: request.model_system_prompt,
            created_at: now,
            updated_at: now,
        };

        let agent = self.agents.create(&agent).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AgentError::NameConflict(agent.name.clone()),
            other => storage(other),
        })?;

        info!(agent_id = %agent.id, name = %agent.name, "Agent created");
        self.audit(
            &agent,
            format!(
                "Agent \"{}\" created with status \"{}\"",
                agent.name, agent.status
            ),
        )
        .await;
        Ok(agent)
    }

    pub async fn get_agent(&self, id: AgentId) -> Result<Agent, AgentError> {
        self.agents
            .get_by_id(id)
            .await
            .map_err(storage)?
            .ok_or(AgentError::NotFound)
    }

    /// List agents, newest first.
    pub async fn list_agents(&self, page: PageRequest) -> Result<Page<Agent>, AgentError> {
        self.agents.list(page).await.map_err(storage)
    }

    /// Apply a partial update. Only fields present in the request change.
    pub async fn update_agent(
        &self,
        id: AgentId,
        request: UpdateAgentRequest,
    ) -> Result<Agent, AgentError> {
        let mut agent = self.get_agent(id).await?;

        if let Some(name) = request.name {
            agent.name = required_name(Some(name))?;
        }
        if let Some(raw) = request.status.as_deref() {
            agent.status = parse_status(raw)?;
        }
        if let Some(sequences) = request.model_stop_sequences {
            check_stop_sequences(&sequences)?;
            agent.model_stop_sequences = sequences;
        }
        if let Some(description) = request.description {
            agent.description = description;
        }
        if let Some(model_name) = request.model_name {
            agent.model_name = model_name;
        }
        if let Some(provider) = request.model_provider {
            agent.model_provider = provider;
        }
        if let Some(url) = request.model_api_url {
            agent.model_api_url = url;
        }
        if let Some(key) = request.model_api_key {
            agent.model_api_key = key;
        }
        if let Some(prompt) = request.model_system_prompt {
            agent.model_system_prompt = prompt;
        }
        agent.model_temperature = request.model_temperature.unwrap_or(agent.model_temperature);
        agent.model_max_tokens = request.model_max_tokens.unwrap_or(agent.model_max_tokens);
        agent.model_top_p = request.model_top_p.unwrap_or(agent.model_top_p);
        agent.model_top_k = request.model_top_k.unwrap_or(agent.model_top_k);
        agent.model_presence_penalty = request
            .model_presence_penalty
            .unwrap_or(agent.model_presence_penalty);
        agent.model_frequency_penalty = request
            .model_frequency_penalty
            .unwrap_or(agent.model_frequency_penalty);
        agent.model_context_window = request
            .model_context_window
            .unwrap_or(agent.model_context_window);
        agent.updated_at = Utc::now();

        let agent = self.agents.update(&agent).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AgentError::NameConflict(agent.name.clone()),
            other => storage(other),
        })?;

        self.audit(&agent, format!("Agent \"{}\" updated", agent.name))
            .await;
        Ok(agent)
    }

    /// Move an agent to a new lifecycle status. Any transition is allowed.
    pub async fn change_status(
        &self,
        id: AgentId,
        status: Option<&str>,
    ) -> Result<Agent, AgentError> {
        let raw = status
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AgentError::Validation("Status is required".to_string()))?;
        let new_status = parse_status(raw)?;

        let mut agent = self.get_agent(id).await?;
        let old_status = agent.status;
        agent.status = new_status;
        agent.updated_at = Utc::now();
        let agent = self.agents.update(&agent).await.map_err(storage)?;

        info!(agent_id = %agent.id, from = %old_status, to = %new_status, "Agent status changed");
        self.audit(
            &agent,
            format!(
                "Agent \"{}\" status changed from \"{old_status}\" to \"{new_status}\"",
                agent.name
            ),
        )
        .await;
        Ok(agent)
    }

    /// Delete an agent. Its conversations, messages and logs go with it.
    pub async fn delete_agent(&self, id: AgentId) -> Result<(), AgentError> {
        let agent = self.get_agent(id).await?;
        self.agents.delete(agent.id).await.map_err(storage)?;
        info!(agent_id = %agent.id, name = %agent.name, "Agent deleted");
        Ok(())
    }

    /// Audit entries of one agent, newest first.
    pub async fn list_agent_logs(
        &self,
        id: AgentId,
        page: PageRequest,
    ) -> Result<Page<AgentLog>, AgentError> {
        let agent = self.get_agent(id).await?;
        self.logs
            .list_for_agent(agent.id, page)
            .await
            .map_err(storage)
    }

    /// Audit entries across all agents, newest first.
    pub async fn list_logs(&self, page: PageRequest) -> Result<Page<AgentLog>, AgentError> {
        self.logs.list_all(page).await.map_err(storage)
    }
}
