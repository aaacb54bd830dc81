//! Platform users and the roles they are assigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::present;

/// A platform user. The password hash never leaves the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub role_ids: Vec<i64>,
    pub role_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user record about to be inserted, with an already-hashed password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub role_ids: Vec<i64>,
}

/// A named group of users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub user_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
    pub role_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
    /// Replaces the full role set when present.
    #[serde(default, deserialize_with = "present")]
    pub role_ids: Option<Option<Vec<i64>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Body of the role membership endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleMembersRequest {
    pub user_ids: Option<Vec<i64>>,
}
