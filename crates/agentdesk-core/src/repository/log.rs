//! Agent audit log repository trait definition.

use agentdesk_types::agent::AgentId;
use agentdesk_types::error::RepositoryError;
use agentdesk_types::log::{AgentLog, LogLevel};
use agentdesk_types::page::{Page, PageRequest};

/// Append-only store of audit entries.
pub trait AgentLogRepository: Send + Sync {
    fn append(
        &self,
        agent_id: AgentId,
        level: LogLevel,
        message: &str,
    ) -> impl std::future::Future<Output = Result<AgentLog, RepositoryError>> + Send;

    /// Entries of one agent, newest first.
    fn list_for_agent(
        &self,
        agent_id: AgentId,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<Page<AgentLog>, RepositoryError>> + Send;

    /// Entries across all agents, newest first.
    fn list_all(
        &self,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<Page<AgentLog>, RepositoryError>> + Send;
}
