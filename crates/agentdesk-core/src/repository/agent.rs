//! Agent repository trait definition.

use agentdesk_types::agent::{Agent, AgentId};
use agentdesk_types::error::RepositoryError;
use agentdesk_types::page::{Page, PageRequest};

/// Repository trait for agent persistence.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait AgentRepository: Send + Sync {
    /// Insert a new agent. The `id` of the argument is ignored; the returned
    /// agent carries the id assigned by the store.
    ///
    /// Fails with `RepositoryError::Conflict` when the name is taken.
    fn create(
        &self,
        agent: &Agent,
    ) -> impl std::future::Future<Output = Result<Agent, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: AgentId,
    ) -> impl std::future::Future<Output = Result<Option<Agent>, RepositoryError>> + Send;

    fn get_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Agent>, RepositoryError>> + Send;

    /// List agents, newest first.
    fn list(
        &self,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<Page<Agent>, RepositoryError>> + Send;

    /// Overwrite every mutable field of an existing agent.
    fn update(
        &self,
        agent: &Agent,
    ) -> impl std::future::Future<Output = Result<Agent, RepositoryError>> + Send;

    /// Delete an agent together with its conversations, messages and logs.
    fn delete(
        &self,
        id: AgentId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
