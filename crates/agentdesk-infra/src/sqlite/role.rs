//! SQLite role repository implementation.

use agentdesk_core::repository::role::RoleRepository;
use agentdesk_types::error::RepositoryError;
use agentdesk_types::page::{Page, PageRequest};
use agentdesk_types::user::Role;
use chrono::Utc;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error, write_error};

#[derive(Clone)]
pub struct SqliteRoleRepository {
    pool: DatabasePool,
}

impl SqliteRoleRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

const SELECT_ROLE: &str = "SELECT r.*, (SELECT COUNT(*) FROM user_roles ur WHERE ur.role_id = r.id) AS user_count
     FROM roles r";

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Role, RepositoryError> {
    let created_at: String = row.try_get("created_at").map_err(query_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(query_error)?;
    Ok(Role {
        id: row.try_get("id").map_err(query_error)?,
        name: row.try_get("name").map_err(query_error)?,
        description: row.try_get("description").map_err(query_error)?,
        user_count: row.try_get("user_count").map_err(query_error)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

impl SqliteRoleRepository {
    /// The ids among `user_ids` that name existing users.
    async fn existing_users(&self, user_ids: &[i64]) -> Result<Vec<i64>, RepositoryError> {
        let mut existing = Vec::with_capacity(user_ids.len());
        for id in user_ids {
            let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
                .bind(*id)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(query_error)?;
            if let Some((id,)) = found {
                existing.push(id);
            }
        }
        Ok(existing)
    }
}

impl RoleRepository for SqliteRoleRepository {
    async fn create(&self, name: &str, description: &str) -> Result<Role, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO roles (name, description, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_error(e, || format!("role '{name}' already exists")))?;

        Ok(Role {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
            user_count: 0,
            created_at: parse_datetime(&now)?,
            updated_at: parse_datetime(&now)?,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Role>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_ROLE} WHERE r.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        row.as_ref().map(decode).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_ROLE} WHERE r.name = ?"))
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        row.as_ref().map(decode).transpose()
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Role>, RepositoryError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM roles")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        let rows = sqlx::query(&format!(
            "{SELECT_ROLE} ORDER BY r.created_at DESC, r.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        let roles = rows.iter().map(decode).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(roles, total, page))
    }

    async fn update(&self, role: &Role) -> Result<Role, RepositoryError> {
        let result = sqlx::query(
            "UPDATE roles SET name = ?, description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&role.name)
        .bind(&role.description)
        .bind(format_datetime(&role.updated_at))
        .bind(role.id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_error(e, || format!("role '{}' already exists", role.name)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(role.id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn add_users(&self, role_id: i64, user_ids: &[i64]) -> Result<u64, RepositoryError> {
        let existing = self.existing_users(user_ids).await?;
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;
        for user_id in &existing {
            sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
                .bind(*user_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }
        tx.commit().await.map_err(query_error)?;
        Ok(existing.len() as u64)
    }

    async fn remove_users(&self, role_id: i64, user_ids: &[i64]) -> Result<u64, RepositoryError> {
        let existing = self.existing_users(user_ids).await?;
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;
        for user_id in &existing {
            sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role_id = ?")
                .bind(*user_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }
        tx.commit().await.map_err(query_error)?;
        Ok(existing.len() as u64)
    }
}
