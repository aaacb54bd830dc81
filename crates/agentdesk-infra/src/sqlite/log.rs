//! SQLite agent audit log repository.

use agentdesk_core::repository::log::AgentLogRepository;
use agentdesk_types::agent::AgentId;
use agentdesk_types::error::RepositoryError;
use agentdesk_types::log::{AgentLog, LogLevel};
use agentdesk_types::page::{Page, PageRequest};
use chrono::Utc;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

#[derive(Clone)]
pub struct SqliteAgentLogRepository {
    pool: DatabasePool,
}

impl SqliteAgentLogRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn page(
        &self,
        agent_id: Option<AgentId>,
        page: PageRequest,
    ) -> Result<Page<AgentLog>, RepositoryError> {
        let filter = agent_id.map(|id| id.0);

        // `? IS NULL` lets one statement serve both the scoped and global listing.
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM agent_logs WHERE (? IS NULL OR agent_id = ?)")
                .bind(filter)
                .bind(filter)
                .fetch_one(&self.pool.reader)
                .await
                .map_err(query_error)?;

        let rows = sqlx::query(
            "SELECT * FROM agent_logs WHERE (? IS NULL OR agent_id = ?)
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(filter)
        .bind(filter)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let logs = rows.iter().map(decode).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(logs, total, page))
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<AgentLog, RepositoryError> {
    let level: String = row.try_get("level").map_err(query_error)?;
    let created_at: String = row.try_get("created_at").map_err(query_error)?;
    Ok(AgentLog {
        id: row.try_get("id").map_err(query_error)?,
        agent_id: AgentId(row.try_get("agent_id").map_err(query_error)?),
        level: level
            .parse::<LogLevel>()
            .map_err(RepositoryError::Query)?,
        message: row.try_get("message").map_err(query_error)?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl AgentLogRepository for SqliteAgentLogRepository {
    async fn append(
        &self,
        agent_id: AgentId,
        level: LogLevel,
        message: &str,
    ) -> Result<AgentLog, RepositoryError> {
        let created_at = format_datetime(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO agent_logs (agent_id, level, message, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(agent_id.0)
        .bind(level.to_string())
        .bind(message)
        .bind(&created_at)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(AgentLog {
            id: result.last_insert_rowid(),
            agent_id,
            level,
            message: message.to_string(),
            created_at: parse_datetime(&created_at)?,
        })
    }

    async fn list_for_agent(
        &self,
        agent_id: AgentId,
        page: PageRequest,
    ) -> Result<Page<AgentLog>, RepositoryError> {
        self.page(Some(agent_id), page).await
    }

    async fn list_all(&self, page: PageRequest) -> Result<Page<AgentLog>, RepositoryError> {
        self.page(None, page).await
    }
}
