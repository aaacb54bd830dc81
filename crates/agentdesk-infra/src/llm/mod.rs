//! Chat-model implementations.

pub mod chat_completions;
