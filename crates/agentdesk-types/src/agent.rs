use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use std::fmt;
use std::str::FromStr;

/// Storage key of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub i64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AgentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

pub const DEFAULT_MODEL_NAME: &str = "llama2";
pub const DEFAULT_MODEL_PROVIDER: &str = "ollama";
pub const DEFAULT_MODEL_API_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: i64 = 2048;
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_TOP_K: i64 = 40;
pub const DEFAULT_CONTEXT_WINDOW: i64 = 4096;

/// Provider name whose agents authenticate with a Bearer token.
pub const OPENAI_PROVIDER: &str = "openai";

/// A named binding to a chat-completion model endpoint.
///
/// The `model_*` fields form the generation configuration sent upstream on
/// every exchange. Field names match the JSON shape of the management API.
#[derive(Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub description: String,
    pub status: AgentStatus,
    pub model_name: String,
    pub model_provider: String,
    pub model_api_url: String,
    pub model_api_key: Option<String>,
    pub model_temperature: f64,
    pub model_max_tokens: i64,
    pub model_top_p: f64,
    pub model_top_k: i64,
    pub model_presence_penalty: f64,
    pub model_frequency_penalty: f64,
    /// Ordered stop sequences. Never contains empty strings or commas.
    pub model_stop_sequences: Vec<String>,
    pub model_context_window: i64,
    pub model_system_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// The system prompt, if one is configured and non-empty. Whitespace
    /// counts as content.
    pub fn system_prompt(&self) -> Option<&str> {
        self.model_system_prompt
            .as_deref()
            .filter(|prompt| !prompt.is_empty())
    }

    /// Whether requests for this agent carry a Bearer `Authorization` header.
    ///
    /// Only `openai` agents with a configured key authenticate; every other
    /// provider is called anonymously even when a key is stored.
    pub fn sends_bearer_token(&self) -> bool {
        self.model_provider == OPENAI_PROVIDER
            && self
                .model_api_key
                .as_deref()
                .is_some_and(|key| !key.is_empty())
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status)
            .field("model_name", &self.model_name)
            .field("model_provider", &self.model_provider)
            .field("model_api_url", &self.model_api_url)
            .field("model_api_key", &self.model_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model_stop_sequences", &self.model_stop_sequences)
            .field("model_system_prompt", &self.model_system_prompt)
            .finish_non_exhaustive()
    }
}

/// Agent lifecycle states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Inactive,
    Running,
    Paused,
    Stopped,
}

impl AgentStatus {
    pub const ALL: [AgentStatus; 4] = [
        AgentStatus::Inactive,
        AgentStatus::Running,
        AgentStatus::Paused,
        AgentStatus::Stopped,
    ];
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Inactive => write!(f, "inactive"),
            AgentStatus::Running => write!(f, "running"),
            AgentStatus::Paused => write!(f, "paused"),
            AgentStatus::Stopped => write!(f, "stopped"),
        }
    }
}

impl FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(AgentStatus::Inactive),
            "running" => Ok(AgentStatus::Running),
            "paused" => Ok(AgentStatus::Paused),
            "stopped" => Ok(AgentStatus::Stopped),
            other => Err(format!(
                "invalid status '{other}'. Must be one of inactive, running, paused, stopped"
            )),
        }
    }
}

/// Registration payload. Only `name` is required; it is optional here so a
/// missing name surfaces as a validation error rather than a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAgentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub model_name: Option<String>,
    pub model_provider: Option<String>,
    pub model_api_url: Option<String>,
    pub model_api_key: Option<String>,
    pub model_temperature: Option<f64>,
    pub model_max_tokens: Option<i64>,
    pub model_top_p: Option<f64>,
    pub model_top_k: Option<i64>,
    pub model_presence_penalty: Option<f64>,
    pub model_frequency_penalty: Option<f64>,
    pub model_stop_sequences: Option<Vec<String>>,
    pub model_context_window: Option<i64>,
    pub model_system_prompt: Option<String>,
}

/// Partial update. Absent fields are left untouched; for the nullable
/// fields an explicit `null` clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub model_name: Option<String>,
    pub model_provider: Option<String>,
    pub model_api_url: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub model_api_key: Option<Option<String>>,
    pub model_temperature: Option<f64>,
    pub model_max_tokens: Option<i64>,
    pub model_top_p: Option<f64>,
    pub model_top_k: Option<i64>,
    pub model_presence_penalty: Option<f64>,
    pub model_frequency_penalty: Option<f64>,
    pub model_stop_sequences: Option<Vec<String>>,
    pub model_context_window: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub model_system_prompt: Option<Option<String>>,
}

/// Marks a field as present, keeping `null` distinguishable from absence.
pub(crate) fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Check that stop sequences survive the comma-delimited storage encoding.
pub fn validate_stop_sequences(sequences: &[String]) -> Result<(), String> {
    for sequence in sequences {
        if sequence.is_empty() {
            return Err("stop sequences must not be empty strings".to_string());
        }
        if sequence.contains(',') {
            return Err(format!("stop sequence '{sequence}' must not contain a comma"));
        }
    }
    Ok(())
}

/// Encode stop sequences for storage. The empty list is stored as absent.
///
/// ```
/// use agentdesk_types::agent::join_stop_sequences;
///
/// assert_eq!(join_stop_sequences(&["a".into(), "b".into()]), Some("a,b".to_string()));
/// assert_eq!(join_stop_sequences(&[]), None);
/// ```
pub fn join_stop_sequences(sequences: &[String]) -> Option<String> {
    if sequences.is_empty() {
        None
    } else {
        Some(sequences.join(","))
    }
}

/// Decode stored stop sequences. Absent or empty values decode to `[]`.
pub fn split_stop_sequences(stored: Option<&str>) -> Vec<String> {
    match stored {
        Some(s) if !s.is_empty() => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}
