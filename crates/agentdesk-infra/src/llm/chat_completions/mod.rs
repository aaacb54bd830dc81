//! OpenAI-compatible chat-completions client.
//!
//! One request per exchange, no streaming. Works against any server that
//! speaks the `/chat/completions` dialect (Ollama, OpenAI, vLLM, ...).

pub mod client;
pub mod types;

pub use client::ChatCompletionsClient;
