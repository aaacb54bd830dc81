//! User management service and first-run seeding.

use agentdesk_types::error::{RepositoryError, UserError};
use agentdesk_types::page::{Page, PageRequest};
use agentdesk_types::user::{CreateUserRequest, NewUser, UpdateUserRequest, User};
use tracing::info;

use crate::repository::role::RoleRepository;
use crate::repository::user::UserRepository;
use crate::service::hash::PasswordHasher;

pub const ADMIN_ROLE: &str = "admin";
pub const USER_ROLE: &str = "user";
pub const ADMIN_USERNAME: &str = "admin";

const DUPLICATE: &str = "Username or email already exists";

fn storage(e: RepositoryError) -> UserError {
    match e {
        RepositoryError::NotFound => UserError::NotFound,
        RepositoryError::Conflict(_) => UserError::Conflict(DUPLICATE.to_string()),
        other => UserError::Storage(other.to_string()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Service for user accounts and their role sets.
pub struct UserService<U: UserRepository, R: RoleRepository, H: PasswordHasher> {
    users: U,
    roles: R,
    hasher: H,
}

impl<U: UserRepository, R: RoleRepository, H: PasswordHasher> UserService<U, R, H> {
    pub fn new(users: U, roles: R, hasher: H) -> Self {
        Self {
            users,
            roles,
            hasher,
        }
    }

    fn hash(&self, password: &str) -> Result<String, UserError> {
        self.hasher.hash(password).map_err(UserError::Hashing)
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserError> {
        let (Some(username), Some(email), Some(password)) = (
            non_blank(request.username),
            non_blank(request.email),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(UserError::Validation(
                "Username, email and password are required".to_string(),
            ));
        };

        let existing = self
            .users
            .find_by_username_or_email(&username, &email)
            .await
            .map_err(storage)?;
        if !existing.is_empty() {
            return Err(UserError::Conflict(DUPLICATE.to_string()));
        }

        let user = self
            .users
            .create(&NewUser {
                password_hash: self.hash(&password)?,
                username,
                email,
                full_name: request.full_name.unwrap_or_default(),
                phone: request.phone.unwrap_or_default(),
                is_active: request.is_active.unwrap_or(true),
                is_admin: request.is_admin.unwrap_or(false),
                role_ids: request.role_ids.unwrap_or_default(),
            })
            .await
            .map_err(storage)?;

        info!(user_id = user.id, username = %user.username, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, UserError> {
        self.users
            .get_by_id(id)
            .await
            .map_err(storage)?
            .ok_or(UserError::NotFound)
    }

    pub async fn list_users(&self, page: PageRequest) -> Result<Page<User>, UserError> {
        self.users.list(page).await.map_err(storage)
    }

    /// Partial update. `password` is rehashed; `role_ids` replaces the set.
    pub async fn update_user(
        &self,
        id: i64,
        request: UpdateUserRequest,
    ) -> Result<User, UserError> {
        let mut user = self.get_user(id).await?;

        if let Some(username) = request.username {
            user.username = non_blank(Some(username))
                .ok_or_else(|| UserError::Validation("Username cannot be empty".to_string()))?;
        }
        if let Some(email) = request.email {
            user.email = non_blank(Some(email))
                .ok_or_else(|| UserError::Validation("Email cannot be empty".to_string()))?;
        }
        let taken = self
            .users
            .find_by_username_or_email(&user.username, &user.email)
            .await
            .map_err(storage)?
            .iter()
            .any(|other| other.id != user.id);
        if taken {
            return Err(UserError::Conflict(DUPLICATE.to_string()));
        }

        if let Some(full_name) = request.full_name {
            user.full_name = full_name;
        }
        if let Some(phone) = request.phone {
            user.phone = phone;
        }
        user.is_active = request.is_active.unwrap_or(user.is_active);
        user.is_admin = request.is_admin.unwrap_or(user.is_admin);
        user.updated_at = chrono::Utc::now();
        self.users.update(&user).await.map_err(storage)?;

        if let Some(password) = request.password.filter(|p| !p.is_empty()) {
            let hash = self.hash(&password)?;
            self.users
                .set_password_hash(id, &hash)
                .await
                .map_err(storage)?;
        }
        if let Some(role_ids) = request.role_ids {
            self.users
                .replace_roles(id, &role_ids.unwrap_or_default())
                .await
                .map_err(storage)?;
        }

        self.get_user(id).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), UserError> {
        self.users.delete(id).await.map_err(storage)?;
        info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Create the `admin` and `user` roles and an `admin` account holding the
    /// admin role. Anything that already exists is left alone.
    pub async fn seed_defaults(&self, admin_password: &str) -> Result<(), UserError> {
        let mut admin_role_id = None;
        for (name, description) in [
            (ADMIN_ROLE, "Administrator with full access"),
            (USER_ROLE, "Regular user"),
        ] {
            let role = match self.roles.get_by_name(name).await.map_err(storage)? {
                Some(role) => role,
                None => {
                    info!(role = name, "Seeding default role");
                    self.roles
                        .create(name, description)
                        .await
                        .map_err(storage)?
                }
            };
            if name == ADMIN_ROLE {
                admin_role_id = Some(role.id);
            }
        }

        if self
            .users
            .get_by_username(ADMIN_USERNAME)
            .await
            .map_err(storage)?
            .is_none()
        {
            info!(username = ADMIN_USERNAME, "Seeding default admin user");
            self.users
                .create(&NewUser {
                    username: ADMIN_USERNAME.to_string(),
                    email: "admin@example.com".to_string(),
                    password_hash: self.hash(admin_password)?,
                    full_name: "System Administrator".to_string(),
                    phone: String::new(),
                    is_active: true,
                    is_admin: true,
                    role_ids: admin_role_id.into_iter().collect(),
                })
                .await
                .map_err(storage)?;
        }
        Ok(())
    }
}
