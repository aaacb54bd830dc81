//! Chat-model abstraction.
//!
//! `ChatModel` is the port the exchange flow calls to get an assistant
//! reply; the HTTP implementation lives in agentdesk-infra.

pub mod provider;
