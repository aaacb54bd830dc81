//! Role repository trait definition.

use agentdesk_types::error::RepositoryError;
use agentdesk_types::page::{Page, PageRequest};
use agentdesk_types::user::Role;

pub trait RoleRepository: Send + Sync {
    /// Fails with `RepositoryError::Conflict` when the name is taken.
    fn create(
        &self,
        name: &str,
        description: &str,
    ) -> impl std::future::Future<Output = Result<Role, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Role>, RepositoryError>> + Send;

    fn get_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Role>, RepositoryError>> + Send;

    /// List roles, newest first.
    fn list(
        &self,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<Page<Role>, RepositoryError>> + Send;

    fn update(
        &self,
        role: &Role,
    ) -> impl std::future::Future<Output = Result<Role, RepositoryError>> + Send;

    fn delete(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Attach the role to every existing user among `user_ids`.
    /// Returns how many of the ids name existing users.
    fn add_users(
        &self,
        role_id: i64,
        user_ids: &[i64],
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Detach the role from every existing user among `user_ids`.
    /// Returns how many of the ids name existing users.
    fn remove_users(
        &self,
        role_id: i64,
        user_ids: &[i64],
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
