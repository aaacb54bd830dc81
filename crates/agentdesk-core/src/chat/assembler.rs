//! Builds the message sequence sent upstream for one conversation.

use agentdesk_types::agent::Agent;
use agentdesk_types::conversation::{Conversation, MessageRole, NewMessage};
use agentdesk_types::error::RepositoryError;
use agentdesk_types::model::ChatMessage;
use chrono::{Duration, Utc};
use tracing::debug;

use crate::repository::conversation::ConversationRepository;

/// Assembles conversation history for the model, injecting the agent's
/// system prompt the first time a conversation is assembled.
///
/// Whether a system message exists is derived from the stored history on
/// every call, never cached. An existing system message is left as-is even
/// when the agent's prompt has changed since it was written.
pub struct ConversationAssembler<'a, C: ConversationRepository> {
    conversations: &'a C,
}

impl<'a, C: ConversationRepository> ConversationAssembler<'a, C> {
    pub fn new(conversations: &'a C) -> Self {
        Self { conversations }
    }

    /// Return the ordered `{role, content}` sequence for `conversation`.
    ///
    /// When a system message is present it is element 0; the remaining
    /// messages follow in creation order. Performs at most one write.
    pub async fn assemble(
        &self,
        agent: &Agent,
        conversation: &Conversation,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let mut messages = self.conversations.list_messages(conversation.id).await?;

        let has_system = messages.iter().any(|m| m.role == MessageRole::System);
        if let (Some(prompt), false) = (agent.system_prompt(), has_system) {
            // Stamp it just before the earliest stored message so creation
            // order keeps it first on every later read.
            let created_at = messages
                .first()
                .map(|m| m.created_at - Duration::microseconds(1))
                .unwrap_or_else(Utc::now);

            let system = self
                .conversations
                .append_message(&NewMessage {
                    conversation_id: conversation.id,
                    role: MessageRole::System,
                    content: prompt.to_string(),
                    created_at,
                })
                .await?;

            debug!(
                conversation_id = %conversation.conversation_id,
                message_id = system.id,
                "Injected system prompt"
            );
            messages.insert(0, system);
        }

        // Stable: user/assistant turns keep their relative order.
        messages.sort_by_key(|m| m.role != MessageRole::System);

        Ok(messages
            .into_iter()
            .map(|m| ChatMessage::new(m.role, m.content))
            .collect())
    }
}
