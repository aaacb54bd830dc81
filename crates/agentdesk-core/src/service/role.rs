//! Role management and role membership.

use agentdesk_types::error::{RepositoryError, RoleError};
use agentdesk_types::page::{Page, PageRequest};
use agentdesk_types::user::{CreateRoleRequest, Role, RoleMembersRequest, UpdateRoleRequest, User};
use tracing::info;

use crate::repository::role::RoleRepository;
use crate::repository::user::UserRepository;

fn storage(e: RepositoryError) -> RoleError {
    match e {
        RepositoryError::NotFound => RoleError::NotFound,
        other => RoleError::Storage(other.to_string()),
    }
}

pub struct RoleService<R: RoleRepository, U: UserRepository> {
    roles: R,
    users: U,
}

impl<R: RoleRepository, U: UserRepository> RoleService<R, U> {
    pub fn new(roles: R, users: U) -> Self {
        Self { roles, users }
    }

    pub async fn create_role(&self, request: CreateRoleRequest) -> Result<Role, RoleError> {
        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| RoleError::Validation("Role name is required".to_string()))?;
        let description = request.description.unwrap_or_default();

        let role = self
            .roles
            .create(&name, &description)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => RoleError::Conflict(name.clone()),
                other => storage(other),
            })?;
        info!(role_id = role.id, name = %role.name, "Role created");
        Ok(role)
    }

    pub async fn get_role(&self, id: i64) -> Result<Role, RoleError> {
        self.roles
            .get_by_id(id)
            .await
            .map_err(storage)?
            .ok_or(RoleError::NotFound)
    }

    pub async fn list_roles(&self, page: PageRequest) -> Result<Page<Role>, RoleError> {
        self.roles.list(page).await.map_err(storage)
    }

    pub async fn update_role(
        &self,
        id: i64,
        request: UpdateRoleRequest,
    ) -> Result<Role, RoleError> {
        let mut role = self.get_role(id).await?;
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(RoleError::Validation("Role name cannot be empty".to_string()));
            }
            role.name = name;
        }
        if let Some(description) = request.description {
            role.description = description;
        }
        role.updated_at = chrono::Utc::now();

        self.roles.update(&role).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => RoleError::Conflict(role.name.clone()),
            other => storage(other),
        })
    }

    /// Delete a role. Refused while any user still holds it.
    pub async fn delete_role(&self, id: i64) -> Result<(), RoleError> {
        let role = self.get_role(id).await?;
        if role.user_count > 0 {
            return Err(RoleError::HasUsers);
        }
        self.roles.delete(id).await.map_err(storage)?;
        info!(role_id = id, name = %role.name, "Role deleted");
        Ok(())
    }

    pub async fn list_role_users(
        &self,
        id: i64,
        page: PageRequest,
    ) -> Result<Page<User>, RoleError> {
        let role = self.get_role(id).await?;
        self.users
            .list_by_role(role.id, page)
            .await
            .map_err(storage)
    }

    fn member_ids(request: RoleMembersRequest) -> Result<Vec<i64>, RoleError> {
        request
            .user_ids
            .ok_or_else(|| RoleError::Validation("user_ids is required".to_string()))
    }

    /// Attach the role to the listed users. Returns how many of the ids
    /// named existing users; unknown ids are skipped.
    pub async fn assign_users(
        &self,
        id: i64,
        request: RoleMembersRequest,
    ) -> Result<u64, RoleError> {
        let user_ids = Self::member_ids(request)?;
        let role = self.get_role(id).await?;
        self.roles
            .add_users(role.id, &user_ids)
            .await
            .map_err(storage)
    }

    /// Detach the role from the listed users.
    pub async fn remove_users(
        &self,
        id: i64,
        request: RoleMembersRequest,
    ) -> Result<u64, RoleError> {
        let user_ids = Self::member_ids(request)?;
        let role = self.get_role(id).await?;
        self.roles
            .remove_users(role.id, &user_ids)
            .await
            .map_err(storage)
    }
}
