//! Business logic and repository trait definitions for agentdesk.
//!
//! This crate defines the ports (repository traits, the chat model trait,
//! the password hasher) that the infrastructure layer implements. It depends
//! only on `agentdesk-types`, never on `agentdesk-infra` or any database or
//! HTTP crate.

pub mod chat;
pub mod llm;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
