//! Chat service: conversation management and the exchange orchestrator.
//!
//! An exchange is one user turn in, one assistant turn out:
//!
//! 1. resolve the agent
//! 2. resolve the conversation, or create one when the caller gave no id
//! 3. persist the user message (kept even if the model call fails)
//! 4. assemble history, injecting the system prompt once
//! 5. call the model
//! 6. persist the assistant reply and write an audit entry
//!
//! Steps 3 to 6 run under a per-conversation lock. Writes are committed one
//! by one; a failure after step 3 leaves the unanswered user turn visible.

use agentdesk_types::agent::{Agent, AgentId};
use agentdesk_types::conversation::{
    Conversation, Message, MessageRole, NewMessage, new_conversation_id,
};
use agentdesk_types::error::ExchangeError;
use agentdesk_types::log::LogLevel;
use agentdesk_types::model::GenerationOverrides;
use tracing::{info, warn};

use crate::chat::assembler::ConversationAssembler;
use crate::chat::locks::ConversationLocks;
use crate::llm::provider::ChatModel;
use crate::repository::agent::AgentRepository;
use crate::repository::conversation::ConversationRepository;
use crate::repository::log::AgentLogRepository;

/// The API surface an exchange arrived through. Selects audit wording and
/// whether a missing conversation id starts a new conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeChannel {
    /// `POST /agents/{id}/chat`
    Chat,
    /// `POST /agents/{id}/invoke`
    Invoke,
    /// `POST /conversations/agents/{id}/conversations/{cid}/messages`
    Conversation,
}

impl ExchangeChannel {
    fn created_suffix(self) -> &'static str {
        match self {
            ExchangeChannel::Chat => " via chat API",
            ExchangeChannel::Invoke => " via invoke API",
            ExchangeChannel::Conversation => "",
        }
    }

    fn content_field(self) -> &'static str {
        match self {
            ExchangeChannel::Invoke => "Input",
            _ => "Content",
        }
    }

    fn exchanged_message(self, agent: &Agent, conversation_id: &str, content: &str) -> String {
        match self {
            ExchangeChannel::Chat => format!(
                "Message exchanged in conversation \"{conversation_id}\" for agent \"{}\" via chat API",
                agent.name
            ),
            ExchangeChannel::Invoke => {
                format!("Agent \"{}\" invoked with input: {content}", agent.name)
            }
            ExchangeChannel::Conversation => format!(
                "Message exchanged in conversation \"{conversation_id}\" for agent \"{}\"",
                agent.name
            ),
        }
    }
}

/// One inbound user turn.
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    pub channel: ExchangeChannel,
    pub content: Option<String>,
    pub conversation_id: Option<String>,
    pub overrides: GenerationOverrides,
}

/// Result of a successful exchange.
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    pub agent: Agent,
    pub conversation: Conversation,
    pub reply: String,
    /// Temperature actually sent upstream.
    pub temperature: f64,
    /// Max tokens actually sent upstream.
    pub max_tokens: i64,
}

/// Orchestrates conversations and chat exchanges.
///
/// Generic over the repositories and the chat model so each test can run
/// against its own isolated instances.
pub struct ChatService<A, C, L, M>
where
    A: AgentRepository,
    C: ConversationRepository,
    L: AgentLogRepository,
    M: ChatModel,
{
    agents: A,
    conversations: C,
    logs: L,
    model: M,
    locks: ConversationLocks,
}

impl<A, C, L, M> ChatService<A, C, L, M>
where
    A: AgentRepository,
    C: ConversationRepository,
    L: AgentLogRepository,
    M: ChatModel,
{
    pub fn new(agents: A, conversations: C, logs: L, model: M) -> Self {
        Self {
            agents,
            conversations,
            logs,
            model,
            locks: ConversationLocks::new(),
        }
    }

    async fn agent(&self, agent_id: AgentId) -> Result<Agent, ExchangeError> {
        self.agents
            .get_by_id(agent_id)
            .await?
            .ok_or(ExchangeError::AgentNotFound)
    }

    async fn conversation(
        &self,
        agent: &Agent,
        conversation_id: &str,
    ) -> Result<Conversation, ExchangeError> {
        self.conversations
            .find(agent.id, conversation_id)
            .await?
            .ok_or_else(|| ExchangeError::ConversationNotFound(conversation_id.to_string()))
    }

    /// Audit entries are best-effort; a failed write is traced, not returned.
    async fn audit(&self, agent: &Agent, level: LogLevel, message: &str) {
        if let Err(e) = self.logs.append(agent.id, level, message).await {
            warn!(agent_id = %agent.id, error = %e, "Failed to write audit log entry");
        }
    }

    async fn open(&self, agent: &Agent, suffix: &str) -> Result<Conversation, ExchangeError> {
        let conversation_id = new_conversation_id();
        let conversation = self.conversations.create(agent.id, &conversation_id).await?;
        info!(
            agent_id = %agent.id,
            conversation_id = %conversation_id,
            "Conversation created"
        );
        self.audit(
            agent,
            LogLevel::Info,
            &format!(
                "Conversation \"{conversation_id}\" created for agent \"{}\"{suffix}",
                agent.name
            ),
        )
        .await;
        Ok(conversation)
    }

    // --- Conversation management ---

    /// Explicitly start a new conversation for an agent.
    pub async fn create_conversation(
        &self,
        agent_id: AgentId,
    ) -> Result<Conversation, ExchangeError> {
        let agent = self.agent(agent_id).await?;
        self.open(&agent, "").await
    }

    /// Conversations of an agent, newest first.
    pub async fn list_conversations(
        &self,
        agent_id: AgentId,
    ) -> Result<Vec<Conversation>, ExchangeError> {
        let agent = self.agent(agent_id).await?;
        Ok(self.conversations.list_for_agent(agent.id).await?)
    }

    /// Messages of a conversation in creation order.
    pub async fn list_messages(
        &self,
        agent_id: AgentId,
        conversation_id: &str,
    ) -> Result<Vec<Message>, ExchangeError> {
        let agent = self.agent(agent_id).await?;
        let conversation = self.conversation(&agent, conversation_id).await?;
        Ok(self.conversations.list_messages(conversation.id).await?)
    }

    // --- Exchange ---

    /// Run one exchange against `agent_id`.
    pub async fn exchange(
        &self,
        agent_id: AgentId,
        request: ExchangeRequest,
    ) -> Result<ExchangeOutcome, ExchangeError> {
        let channel = request.channel;
        let agent = self.agent(agent_id).await?;

        let content = request
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                ExchangeError::Validation(format!("{} is required", channel.content_field()))
            })?;

        let conversation = match (request.conversation_id.as_deref(), channel) {
            (Some(cid), _) => self.conversation(&agent, cid).await?,
            (None, ExchangeChannel::Conversation) => {
                return Err(ExchangeError::Validation(
                    "conversation_id is required".to_string(),
                ));
            }
            (None, _) => self.open(&agent, channel.created_suffix()).await?,
        };

        let _guard = self.locks.acquire(conversation.id).await;

        self.conversations
            .append_message(&NewMessage::now(
                conversation.id,
                MessageRole::User,
                content.as_str(),
            ))
            .await?;

        let messages = ConversationAssembler::new(&self.conversations)
            .assemble(&agent, &conversation)
            .await?;

        let reply = match self
            .model
            .complete(&agent, &messages, request.overrides)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    agent_id = %agent.id,
                    conversation_id = %conversation.conversation_id,
                    error = %e,
                    "Model call failed"
                );
                self.audit(
                    &agent,
                    LogLevel::Error,
                    &format!(
                        "Model API error in conversation \"{}\": {e}",
                        conversation.conversation_id
                    ),
                )
                .await;
                return Err(e.into());
            }
        };

        self.conversations
            .append_message(&NewMessage::now(
                conversation.id,
                MessageRole::Assistant,
                reply.as_str(),
            ))
            .await?;

        self.audit(
            &agent,
            LogLevel::Info,
            &channel.exchanged_message(&agent, &conversation.conversation_id, &content),
        )
        .await;

        info!(
            agent_id = %agent.id,
            conversation_id = %conversation.conversation_id,
            "Message exchanged"
        );

        Ok(ExchangeOutcome {
            temperature: request
                .overrides
                .temperature
                .unwrap_or(agent.model_temperature),
            max_tokens: request
                .overrides
                .max_tokens
                .unwrap_or(agent.model_max_tokens),
            agent,
            conversation,
            reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::test_support::{MemoryStore, Scripted, ScriptedModel, sample_agent};

    type TestService = ChatService<MemoryStore, MemoryStore, MemoryStore, ScriptedModel>;

    fn service(store: &MemoryStore, model: &ScriptedModel) -> TestService {
        ChatService::new(store.clone(), store.clone(), store.clone(), model.clone())
    }

    fn chat(content: &str, conversation_id: Option<&str>) -> ExchangeRequest {
        ExchangeRequest {
            channel: ExchangeChannel::Chat,
            content: Some(content.to_string()),
            conversation_id: conversation_id.map(str::to_string),
            overrides: GenerationOverrides::default(),
        }
    }

    #[tokio::test]
    async fn test_chat_without_id_creates_conversation() {
        let store = MemoryStore::default();
        let model = ScriptedModel::replying(&["hi there"]);
        let agent = sample_agent(&store, "bot1").await;
        let svc = service(&store, &model);

        let outcome = svc.exchange(agent.id, chat("hello", None)).await.unwrap();

        assert_eq!(outcome.reply, "hi there");
        assert_eq!(store.conversation_count(), 1);
        let messages = svc
            .list_messages(agent.id, &outcome.conversation.conversation_id)
            .await
            .unwrap();
        let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant]);

        let logs: Vec<String> = store.logs().into_iter().map(|l| l.message).collect();
        assert!(logs[0].contains("created for agent \"bot1\" via chat API"));
        assert!(logs[1].starts_with("Message exchanged in conversation"));
    }

    #[tokio::test]
    async fn test_follow_up_appends_to_same_conversation() {
        let store = MemoryStore::default();
        let model = ScriptedModel::replying(&["first", "second"]);
        let mut agent = sample_agent(&store, "bot1").await;
        agent.model_system_prompt = Some("Be kind.".to_string());
        AgentRepository::update(&store, &agent).await.unwrap();
        let svc = service(&store, &model);

        let first = svc.exchange(agent.id, chat("one", None)).await.unwrap();
        let cid = first.conversation.conversation_id.clone();
        let second = svc.exchange(agent.id, chat("two", Some(&cid))).await.unwrap();
        assert_eq!(second.conversation.id, first.conversation.id);
        assert_eq!(store.conversation_count(), 1);

        let messages = svc.list_messages(agent.id, &cid).await.unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Be kind.", "one", "first", "two", "second"]);

        // The second model call saw the full history with the prompt first.
        let calls = model.calls();
        assert_eq!(calls[1].0.len(), 4);
        assert_eq!(calls[1].0[0].role, MessageRole::System);
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_not_created() {
        let store = MemoryStore::default();
        let model = ScriptedModel::default();
        let agent = sample_agent(&store, "bot1").await;
        let svc = service(&store, &model);

        let err = svc
            .exchange(agent.id, chat("hello", Some("no-such-id")))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::ConversationNotFound(_)));
        assert_eq!(store.conversation_count(), 0);
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_agent() {
        let store = MemoryStore::default();
        let svc = service(&store, &ScriptedModel::default());
        let err = svc
            .exchange(AgentId(99), chat("hello", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::AgentNotFound));
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected_before_any_write() {
        let store = MemoryStore::default();
        let agent = sample_agent(&store, "bot1").await;
        let svc = service(&store, &ScriptedModel::default());

        let err = svc.exchange(agent.id, chat("   ", None)).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Validation(_)));
        assert_eq!(store.conversation_count(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_keeps_user_message() {
        let store = MemoryStore::default();
        let model = ScriptedModel::default();
        model.then(Scripted::HttpError(500));
        let agent = sample_agent(&store, "bot1").await;
        let svc = service(&store, &model);
        let conversation = svc.create_conversation(agent.id).await.unwrap();

        let err = svc
            .exchange(agent.id, chat("hello", Some(&conversation.conversation_id)))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Upstream(_)));

        let messages = svc
            .list_messages(agent.id, &conversation.conversation_id)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "hello");

        let last = store.logs().pop().unwrap();
        assert_eq!(last.level, LogLevel::Error);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_distinct_error() {
        let store = MemoryStore::default();
        let model = ScriptedModel::default();
        model.then(Scripted::Malformed);
        let agent = sample_agent(&store, "bot1").await;
        let svc = service(&store, &model);

        let err = svc.exchange(agent.id, chat("hello", None)).await.unwrap_err();
        assert!(matches!(err, ExchangeError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_invoke_overrides_are_forwarded_and_echoed() {
        let store = MemoryStore::default();
        let model = ScriptedModel::replying(&["done"]);
        let agent = sample_agent(&store, "bot1").await;
        let svc = service(&store, &model);

        let overrides = GenerationOverrides {
            temperature: Some(0.1),
            max_tokens: None,
        };
        let outcome = svc
            .exchange(
                agent.id,
                ExchangeRequest {
                    channel: ExchangeChannel::Invoke,
                    content: Some("summarize".to_string()),
                    conversation_id: None,
                    overrides,
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.temperature, 0.1);
        assert_eq!(outcome.max_tokens, agent.model_max_tokens);
        assert_eq!(model.calls()[0].1, overrides);

        let logs: Vec<String> = store.logs().into_iter().map(|l| l.message).collect();
        assert!(logs[0].ends_with("via invoke API"));
        assert_eq!(logs[1], "Agent \"bot1\" invoked with input: summarize");
    }

    #[tokio::test]
    async fn test_conversation_channel_requires_existing_conversation() {
        let store = MemoryStore::default();
        let agent = sample_agent(&store, "bot1").await;
        let svc = service(&store, &ScriptedModel::default());

        let err = svc
            .exchange(
                agent.id,
                ExchangeRequest {
                    channel: ExchangeChannel::Conversation,
                    content: Some("hi".to_string()),
                    conversation_id: None,
                    overrides: GenerationOverrides::default(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Validation(_)));
        assert_eq!(store.conversation_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_exchanges_do_not_interleave() {
        let store = MemoryStore::default();
        let model = ScriptedModel::replying(&["r1", "r2"]);
        let agent = sample_agent(&store, "bot1").await;
        let svc = Arc::new(service(&store, &model));
        let conversation = svc.create_conversation(agent.id).await.unwrap();
        let cid = conversation.conversation_id.clone();

        let a = {
            let svc = Arc::clone(&svc);
            let cid = cid.clone();
            tokio::spawn(async move { svc.exchange(agent.id, chat("a", Some(&cid))).await })
        };
        let b = {
            let svc = Arc::clone(&svc);
            let cid = cid.clone();
            tokio::spawn(async move { svc.exchange(agent.id, chat("b", Some(&cid))).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let roles: Vec<MessageRole> = svc
            .list_messages(agent.id, &cid)
            .await
            .unwrap()
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
    }
}
