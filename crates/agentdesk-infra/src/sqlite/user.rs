//! SQLite user repository implementation.
//!
//! Role membership lives in `user_roles`; `role_ids` and `role_names` are
//! loaded alongside each user.

use agentdesk_core::repository::user::UserRepository;
use agentdesk_types::error::RepositoryError;
use agentdesk_types::page::{Page, PageRequest};
use agentdesk_types::user::{NewUser, User};
use chrono::Utc;
use sqlx::{Row, SqliteConnection};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error, write_error};

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    id: i64,
    username: String,
    email: String,
    full_name: String,
    phone: String,
    is_active: bool,
    is_admin: bool,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            phone: row.try_get("phone")?,
            is_active: row.try_get("is_active")?,
            is_admin: row.try_get("is_admin")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_user(self, roles: Vec<(i64, String)>) -> Result<User, RepositoryError> {
        let (role_ids, role_names) = roles.into_iter().unzip();
        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            phone: self.phone,
            is_active: self.is_active,
            is_admin: self.is_admin,
            role_ids,
            role_names,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

const DUPLICATE: &str = "username or email already exists";

/// Attach every existing role among `role_ids`; unknown ids are skipped.
async fn attach_roles(
    conn: &mut SqliteConnection,
    user_id: i64,
    role_ids: &[i64],
) -> Result<(), RepositoryError> {
    for role_id in role_ids {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) SELECT ?, id FROM roles WHERE id = ?")
            .bind(user_id)
            .bind(*role_id)
            .execute(&mut *conn)
            .await
            .map_err(query_error)?;
    }
    Ok(())
}

impl SqliteUserRepository {
    async fn roles_of(&self, user_id: i64) -> Result<Vec<(i64, String)>, RepositoryError> {
        sqlx::query_as(
            "SELECT r.id, r.name FROM roles r JOIN user_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = ? ORDER BY r.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)
    }

    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
        let user_row = UserRow::from_row(row).map_err(query_error)?;
        let roles = self.roles_of(user_row.id).await?;
        user_row.into_user(roles)
    }

    async fn hydrate_all(&self, rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<User>, RepositoryError> {
        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(self.hydrate(row).await?);
        }
        Ok(users)
    }

    async fn fetch_one(&self, sql: &str, key: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(sql)
            .bind(key)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, full_name, phone, is_active, is_admin, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, || DUPLICATE.to_string()))?;

        let id = result.last_insert_rowid();
        attach_roles(&mut *tx, id, &user.role_ids).await?;
        tx.commit().await.map_err(query_error)?;

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        self.fetch_one("SELECT * FROM users WHERE username = ?", username)
            .await
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM users WHERE username = ? OR email = ? ORDER BY id")
            .bind(username)
            .bind(email)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;
        self.hydrate_all(&rows).await
    }

    async fn list(&self, page: PageRequest) -> Result<Page<User>, RepositoryError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        let rows = sqlx::query(
            "SELECT * FROM users ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        Ok(Page::new(self.hydrate_all(&rows).await?, total, page))
    }

    async fn list_by_role(
        &self,
        role_id: i64,
        page: PageRequest,
    ) -> Result<Page<User>, RepositoryError> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_roles WHERE role_id = ?")
                .bind(role_id)
                .fetch_one(&self.pool.reader)
                .await
                .map_err(query_error)?;
        let rows = sqlx::query(
            "SELECT u.* FROM users u JOIN user_roles ur ON ur.user_id = u.id
             WHERE ur.role_id = ? ORDER BY u.created_at DESC, u.id DESC LIMIT ? OFFSET ?",
        )
        .bind(role_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        Ok(Page::new(self.hydrate_all(&rows).await?, total, page))
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET username = ?, email = ?, full_name = ?, phone = ?, is_active = ?, is_admin = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(format_datetime(&user.updated_at))
        .bind(user.id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_error(e, || DUPLICATE.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(user.id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(format_datetime(&Utc::now()))
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn replace_roles(&self, id: i64, role_ids: &[i64]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;
        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        attach_roles(&mut *tx, id, role_ids).await?;
        tx.commit().await.map_err(query_error)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
