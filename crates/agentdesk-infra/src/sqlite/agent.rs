//! SQLite agent repository implementation.
//!
//! Implements `AgentRepository` from `agentdesk-core` using sqlx with split
//! read/write pools. Stop sequences are stored as one comma-joined TEXT
//! column, NULL for the empty list.

use agentdesk_core::repository::agent::AgentRepository;
use agentdesk_types::agent::{Agent, AgentId, AgentStatus, join_stop_sequences, split_stop_sequences};
use agentdesk_types::error::RepositoryError;
use agentdesk_types::page::{Page, PageRequest};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error, write_error};

/// SQLite-backed implementation of `AgentRepository`.
#[derive(Clone)]
pub struct SqliteAgentRepository {
    pool: DatabasePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Agent.
struct AgentRow {
    id: i64,
    name: String,
    description: String,
    status: String,
    model_name: String,
    model_provider: String,
    model_api_url: String,
    model_api_key: Option<String>,
    model_temperature: f64,
    model_max_tokens: i64,
    model_top_p: f64,
    model_top_k: i64,
    model_presence_penalty: f64,
    model_frequency_penalty: f64,
    model_stop_sequences: Option<String>,
    model_context_window: i64,
    model_system_prompt: Option<String>,
    created_at: String,
    updated_at: String,
}

impl AgentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            model_name: row.try_get("model_name")?,
            model_provider: row.try_get("model_provider")?,
            model_api_url: row.try_get("model_api_url")?,
            model_api_key: row.try_get("model_api_key")?,
            model_temperature: row.try_get("model_temperature")?,
            model_max_tokens: row.try_get("model_max_tokens")?,
            model_top_p: row.try_get("model_top_p")?,
            model_top_k: row.try_get("model_top_k")?,
            model_presence_penalty: row.try_get("model_presence_penalty")?,
            model_frequency_penalty: row.try_get("model_frequency_penalty")?,
            model_stop_sequences: row.try_get("model_stop_sequences")?,
            model_context_window: row.try_get("model_context_window")?,
            model_system_prompt: row.try_get("model_system_prompt")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_agent(self) -> Result<Agent, RepositoryError> {
        let status: AgentStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Agent {
            id: AgentId(self.id),
            name: self.name,
            description: self.description,
            status,
            model_name: self.model_name,
            model_provider: self.model_provider,
            model_api_url: self.model_api_url,
            model_api_key: self.model_api_key,
            model_temperature: self.model_temperature,
            model_max_tokens: self.model_max_tokens,
            model_top_p: self.model_top_p,
            model_top_k: self.model_top_k,
            model_presence_penalty: self.model_presence_penalty,
            model_frequency_penalty: self.model_frequency_penalty,
            model_stop_sequences: split_stop_sequences(self.model_stop_sequences.as_deref()),
            model_context_window: self.model_context_window,
            model_system_prompt: self.model_system_prompt,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Agent, RepositoryError> {
    AgentRow::from_row(row).map_err(query_error)?.into_agent()
}

impl SqliteAgentRepository {
    async fn fetch_by_id(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        row.as_ref().map(decode).transpose()
    }
}

impl AgentRepository for SqliteAgentRepository {
    async fn create(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO agents (name, description, status, model_name, model_provider, model_api_url, model_api_key,
                                 model_temperature, model_max_tokens, model_top_p, model_top_k,
                                 model_presence_penalty, model_frequency_penalty, model_stop_sequences,
                                 model_context_window, model_system_prompt, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(agent.status.to_string())
        .bind(&agent.model_name)
        .bind(&agent.model_provider)
        .bind(&agent.model_api_url)
        .bind(&agent.model_api_key)
        .bind(agent.model_temperature)
        .bind(agent.model_max_tokens)
        .bind(agent.model_top_p)
        .bind(agent.model_top_k)
        .bind(agent.model_presence_penalty)
        .bind(agent.model_frequency_penalty)
        .bind(join_stop_sequences(&agent.model_stop_sequences))
        .bind(agent.model_context_window)
        .bind(&agent.model_system_prompt)
        .bind(format_datetime(&agent.created_at))
        .bind(format_datetime(&agent.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_error(e, || format!("agent '{}' already exists", agent.name)))?;

        let id = AgentId(result.last_insert_rowid());
        self.fetch_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn get_by_id(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError> {
        self.fetch_by_id(id).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM agents WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        row.as_ref().map(decode).transpose()
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Agent>, RepositoryError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM agents")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let rows = sqlx::query(
            "SELECT * FROM agents ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let agents = rows.iter().map(decode).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(agents, total, page))
    }

    async fn update(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        let result = sqlx::query(
            "UPDATE agents SET name = ?, description = ?, status = ?, model_name = ?, model_provider = ?,
                    model_api_url = ?, model_api_key = ?, model_temperature = ?, model_max_tokens = ?,
                    model_top_p = ?, model_top_k = ?, model_presence_penalty = ?, model_frequency_penalty = ?,
                    model_stop_sequences = ?, model_context_window = ?, model_system_prompt = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(agent.status.to_string())
        .bind(&agent.model_name)
        .bind(&agent.model_provider)
        .bind(&agent.model_api_url)
        .bind(&agent.model_api_key)
        .bind(agent.model_temperature)
        .bind(agent.model_max_tokens)
        .bind(agent.model_top_p)
        .bind(agent.model_top_k)
        .bind(agent.model_presence_penalty)
        .bind(agent.model_frequency_penalty)
        .bind(join_stop_sequences(&agent.model_stop_sequences))
        .bind(agent.model_context_window)
        .bind(&agent.model_system_prompt)
        .bind(format_datetime(&agent.updated_at))
        .bind(agent.id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_error(e, || format!("agent '{}' already exists", agent.name)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.fetch_by_id(agent.id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: AgentId) -> Result<(), RepositoryError> {
        // Conversations, messages and logs follow via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sqlite::test_pool;
    use agentdesk_types::agent::{
        DEFAULT_CONTEXT_WINDOW, DEFAULT_MAX_TOKENS, DEFAULT_MODEL_API_URL, DEFAULT_MODEL_NAME,
        DEFAULT_MODEL_PROVIDER, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P,
    };
    use chrono::Utc;

    pub(crate) fn make_agent(name: &str) -> Agent {
        let now = Utc::now();
        Agent {
            id: AgentId(0),
            name: name.to_string(),
            description: format!("The {name} agent"),
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
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_round_trips() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        let mut agent = make_agent("bot1");
        agent.model_api_key = Some("sk-test".to_string());
        agent.model_stop_sequences = vec!["###".to_string(), "END".to_string()];
        agent.model_system_prompt = Some("Be concise.".to_string());

        let created = repo.create(&agent).await.unwrap();
        assert!(created.id.0 > 0);

        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.name, "bot1");
        assert_eq!(found.model_api_key.as_deref(), Some("sk-test"));
        assert_eq!(found.model_stop_sequences, vec!["###", "END"]);
        assert_eq!(found.model_system_prompt.as_deref(), Some("Be concise."));
        assert_eq!(found.status, AgentStatus::Inactive);
    }

    #[tokio::test]
    async fn test_empty_stop_sequences_stored_as_null() {
        let pool = test_pool().await;
        let repo = SqliteAgentRepository::new(pool.clone());
        let created = repo.create(&make_agent("bot1")).await.unwrap();

        let (raw,): (Option<String>,) =
            sqlx::query_as("SELECT model_stop_sequences FROM agents WHERE id = ?")
                .bind(created.id.0)
                .fetch_one(&pool.reader)
                .await
                .unwrap();
        assert!(raw.is_none());
        assert!(created.model_stop_sequences.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        repo.create(&make_agent("bot1")).await.unwrap();
        let err = repo.create(&make_agent("bot1")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_is_paginated_newest_first() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        for name in ["a", "b", "c"] {
            repo.create(&make_agent(name)).await.unwrap();
        }

        let page = repo.list(PageRequest::new(1, 2, 100)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.pages(), 2);
        let names: Vec<&str> = page.items.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);

        let rest = repo.list(PageRequest::new(2, 2, 100)).await.unwrap();
        assert_eq!(rest.items.len(), 1);
        assert_eq!(rest.items[0].name, "a");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        let mut agent = repo.create(&make_agent("bot1")).await.unwrap();

        agent.status = AgentStatus::Running;
        agent.model_temperature = 0.2;
        let updated = repo.update(&agent).await.unwrap();
        assert_eq!(updated.status, AgentStatus::Running);
        assert_eq!(updated.model_temperature, 0.2);

        repo.delete(agent.id).await.unwrap();
        assert!(repo.get_by_id(agent.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(agent.id).await.unwrap_err(),
            RepositoryError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_rename_onto_taken_name_conflicts() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        repo.create(&make_agent("bot1")).await.unwrap();
        let mut second = repo.create(&make_agent("bot2")).await.unwrap();
        second.name = "bot1".to_string();
        assert!(matches!(
            repo.update(&second).await.unwrap_err(),
            RepositoryError::Conflict(_)
        ));
    }
}
