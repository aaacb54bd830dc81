//! Wire types for the OpenAI-compatible `/chat/completions` endpoint.
//!
//! Only the fields agentdesk sends or reads are modelled. Unknown response
//! fields are ignored.

use serde::{Deserialize, Serialize};

use agentdesk_types::model::ChatMessage;

/// Request body for `POST {base}/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f64,
    pub max_tokens: i64,
    pub top_p: f64,
    pub top_k: i64,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
    /// Omitted entirely when the agent has no stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<&'a [String]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

impl ChatCompletionResponse {
    /// `choices[0].message.content`, if present.
    pub fn into_reply(self) -> Option<String> {
        self.choices.into_iter().next().map(|c| c.message.content)
    }
}
