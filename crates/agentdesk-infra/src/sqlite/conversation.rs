//! SQLite conversation and message repository implementation.

use agentdesk_core::repository::conversation::ConversationRepository;
use agentdesk_types::agent::AgentId;
use agentdesk_types::conversation::{Conversation, Message, MessageRole, NewMessage};
use agentdesk_types::error::RepositoryError;
use chrono::Utc;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error, write_error};

/// SQLite-backed implementation of `ConversationRepository`.
#[derive(Clone)]
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: i64,
    agent_id: i64,
    conversation_id: String,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            agent_id: row.try_get("agent_id")?,
            conversation_id: row.try_get("conversation_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        Ok(Conversation {
            id: self.id,
            agent_id: AgentId(self.agent_id),
            conversation_id: self.conversation_id,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: i64,
    conversation_id: i64,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        Ok(Message {
            id: self.id,
            conversation_id: self.conversation_id,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn decode_conversation(row: &sqlx::sqlite::SqliteRow) -> Result<Conversation, RepositoryError> {
    ConversationRow::from_row(row)
        .map_err(query_error)?
        .into_conversation()
}

fn decode_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, RepositoryError> {
    MessageRow::from_row(row).map_err(query_error)?.into_message()
}

impl ConversationRepository for SqliteConversationRepository {
    async fn create(
        &self,
        agent_id: AgentId,
        conversation_id: &str,
    ) -> Result<Conversation, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO conversations (agent_id, conversation_id, created_at, updated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(agent_id.0)
        .bind(conversation_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_error(e, || format!("conversation '{conversation_id}' already exists")))?;

        Ok(Conversation {
            id: result.last_insert_rowid(),
            agent_id,
            conversation_id: conversation_id.to_string(),
            created_at: parse_datetime(&now)?,
            updated_at: parse_datetime(&now)?,
        })
    }

    async fn find(
        &self,
        agent_id: AgentId,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM conversations WHERE agent_id = ? AND conversation_id = ?",
        )
        .bind(agent_id.0)
        .bind(conversation_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;
        row.as_ref().map(decode_conversation).transpose()
    }

    async fn list_for_agent(
        &self,
        agent_id: AgentId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM conversations WHERE agent_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(agent_id.0)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        rows.iter().map(decode_conversation).collect()
    }

    async fn append_message(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        // INSERT message + touch the conversation in one transaction.
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let created_at = format_datetime(&message.created_at);
        let result = sqlx::query(
            "INSERT INTO messages (conversation_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(message.conversation_id)
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(message.conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        Ok(Message {
            id: result.last_insert_rowid(),
            conversation_id: message.conversation_id,
            role: message.role,
            content: message.content.clone(),
            created_at: parse_datetime(&created_at)?,
        })
    }

    async fn list_messages(&self, conversation: i64) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        rows.iter().map(decode_message).collect()
    }
}
