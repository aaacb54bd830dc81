//! Conversation state and the chat exchange flow.
//!
//! - `assembler`: builds the outbound message sequence, injecting the
//!   agent's system prompt once per conversation
//! - `locks`: per-conversation sequencing of exchanges
//! - `service`: conversation management and the exchange orchestrator

pub mod assembler;
pub mod locks;
pub mod service;
