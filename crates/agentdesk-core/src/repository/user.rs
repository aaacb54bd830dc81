//! User repository trait definition.

use agentdesk_types::error::RepositoryError;
use agentdesk_types::page::{Page, PageRequest};
use agentdesk_types::user::{NewUser, User};

pub trait UserRepository: Send + Sync {
    /// Insert a user and attach the roles in `user.role_ids` that exist.
    ///
    /// Fails with `RepositoryError::Conflict` on a duplicate username or email.
    fn create(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn get_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Users matching either the username or the email.
    fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    /// List users, newest first.
    fn list(
        &self,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<Page<User>, RepositoryError>> + Send;

    /// Users holding a role, newest first.
    fn list_by_role(
        &self,
        role_id: i64,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<Page<User>, RepositoryError>> + Send;

    /// Write the scalar profile fields. Roles and password are untouched.
    fn update(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn set_password_hash(
        &self,
        id: i64,
        password_hash: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Replace the user's role set with the existing roles among `role_ids`.
    fn replace_roles(
        &self,
        id: i64,
        role_ids: &[i64],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn delete(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
