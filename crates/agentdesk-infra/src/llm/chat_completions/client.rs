//! ChatCompletionsClient -- the HTTP [`ChatModel`] implementation.
//!
//! Every call targets the agent's own endpoint, so one client serves all
//! agents. The agent's API key is wrapped in [`SecretString`] for the
//! duration of the call and only exposed when building the header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use agentdesk_core::llm::provider::ChatModel;
use agentdesk_types::agent::Agent;
use agentdesk_types::model::{ChatMessage, GenerationOverrides, ModelError};

use super::types::{ChatCompletionRequest, ChatCompletionResponse};

/// Shared HTTP client for OpenAI-compatible chat-completion endpoints.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
}

impl ChatCompletionsClient {
    /// Build a client. `timeout` bounds each upstream call; `None` keeps the
    /// transport default (no timeout).
    pub fn new(timeout: Option<Duration>) -> Result<Self, ModelError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ModelError::Client(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// `{model_api_url}/chat/completions`, tolerating a trailing slash.
    pub fn endpoint(agent: &Agent) -> String {
        format!(
            "{}/chat/completions",
            agent.model_api_url.trim_end_matches('/')
        )
    }

    fn request_body<'a>(
        agent: &'a Agent,
        messages: &'a [ChatMessage],
        overrides: GenerationOverrides,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &agent.model_name,
            messages,
            temperature: overrides.temperature.unwrap_or(agent.model_temperature),
            max_tokens: overrides.max_tokens.unwrap_or(agent.model_max_tokens),
            top_p: agent.model_top_p,
            top_k: agent.model_top_k,
            presence_penalty: agent.model_presence_penalty,
            frequency_penalty: agent.model_frequency_penalty,
            stop: (!agent.model_stop_sequences.is_empty())
                .then_some(agent.model_stop_sequences.as_slice()),
        }
    }

    /// The bearer token is only sent to `openai` agents with a key set.
    fn bearer_token(agent: &Agent) -> Option<SecretString> {
        if !agent.sends_bearer_token() {
            return None;
        }
        agent
            .model_api_key
            .as_deref()
            .map(|key| SecretString::from(key.to_string()))
    }
}

impl ChatModel for ChatCompletionsClient {
    #[tracing::instrument(
        name = "chat",
        skip_all,
        fields(
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = %agent.model_provider,
            gen_ai.request.model = %agent.model_name,
            gen_ai.request.temperature = overrides.temperature.unwrap_or(agent.model_temperature),
            gen_ai.request.max_tokens = overrides.max_tokens.unwrap_or(agent.model_max_tokens),
            message_count = messages.len(),
        )
    )]
    async fn complete(
        &self,
        agent: &Agent,
        messages: &[ChatMessage],
        overrides: GenerationOverrides,
    ) -> Result<String, ModelError> {
        let url = Self::endpoint(agent);
        let body = Self::request_body(agent, messages, overrides);

        let mut request = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body);
        if let Some(token) = Self::bearer_token(agent) {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| ModelError::Upstream {
            status: None,
            message: format!("HTTP request failed: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ModelError::Upstream {
                status: Some(status.as_u16()),
                message: format!("HTTP {status}: {error_body}"),
            });
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            ModelError::MalformedResponse(format!("failed to parse response: {e}"))
        })?;
        let reply = parsed.into_reply().ok_or_else(|| {
            ModelError::MalformedResponse("response has no choices".to_string())
        })?;

        debug!(reply_len = reply.len(), "Chat completion received");
        Ok(reply)
    }
}
