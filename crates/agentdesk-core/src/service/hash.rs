//! PasswordHasher trait for one-way credential hashing.
//!
//! Defined in agentdesk-core so the user service can store credentials
//! without coupling to a specific algorithm. The argon2 adapter lives in
//! agentdesk-infra.

/// Abstraction over password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` into a self-describing (PHC) string.
    fn hash(&self, password: &str) -> Result<String, String>;

    /// Check `password` against a hash produced by [`PasswordHasher::hash`].
    fn verify(&self, password: &str, hash: &str) -> bool;
}
