//! PostgreSQL-backed user directory

use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;

use super::{NewUser, User, UserDirectory};
use crate::error::{DatabaseError, DatabaseResult};

const USER_COLUMNS: &str = "id, username, password_hash, full_name, role, created_at";

/// User directory stored in the `users` table
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a new user directory
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> DatabaseResult<User> {
    let role: String = row.try_get("role").map_err(DatabaseError::Query)?;

    Ok(User {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        username: row.try_get("username").map_err(DatabaseError::Query)?,
        password_hash: row.try_get("password_hash").map_err(DatabaseError::Query)?,
        full_name: row.try_get("full_name").map_err(DatabaseError::Query)?,
        role: role.parse().map_err(DatabaseError::Decode)?,
        created_at: row.try_get("created_at").map_err(DatabaseError::Query)?,
    })
}

impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        info!("Finding user by ID: {}", id);

        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        info!("Finding user by username: {}", username);

        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn exists_by_username(&self, username: &str) -> DatabaseResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.username);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(&new_user.full_name)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        user_from_row(&row)
    }
}
