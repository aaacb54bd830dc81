//! ChatModel trait definition.

use agentdesk_types::agent::Agent;
use agentdesk_types::model::{ChatMessage, GenerationOverrides, ModelError};

/// A backend that turns an ordered message sequence into one assistant reply.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). The agent
/// carries the endpoint, credentials and generation parameters; `overrides`
/// replace temperature and max tokens for a single call.
pub trait ChatModel: Send + Sync {
    fn complete(
        &self,
        agent: &Agent,
        messages: &[ChatMessage],
        overrides: GenerationOverrides,
    ) -> impl std::future::Future<Output = Result<String, ModelError>> + Send;
}
