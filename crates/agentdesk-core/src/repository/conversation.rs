//! Conversation and message repository trait definition.

use agentdesk_types::agent::AgentId;
use agentdesk_types::conversation::{Conversation, Message, NewMessage};
use agentdesk_types::error::RepositoryError;

/// Repository trait for conversations and their messages.
pub trait ConversationRepository: Send + Sync {
    /// Create a conversation with the given external identifier.
    fn create(
        &self,
        agent_id: AgentId,
        conversation_id: &str,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Look up a conversation by its external identifier, scoped to one agent.
    fn find(
        &self,
        agent_id: AgentId,
        conversation_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// All conversations of an agent, newest first.
    fn list_for_agent(
        &self,
        agent_id: AgentId,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Persist a message and touch the conversation's `updated_at`.
    fn append_message(
        &self,
        message: &NewMessage,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Messages of a conversation ordered by creation time, ties broken by
    /// insertion order.
    fn list_messages(
        &self,
        conversation: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;
}
