//! Cryptographic operations for agentdesk.
//!
//! - `password`: Argon2id hashing for user credentials

pub mod password;
