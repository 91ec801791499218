use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::user::{NewUser, Role, User, UserUpdate},
    services::password,
};

/// User store for database operations
#[derive(Clone)]
pub struct UserStore {
    pool: DbPool,
}

impl UserStore {
    /// Create a new UserStore with the provided database pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a list of all users
    pub async fn get_all_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name COLLATE NOCASE")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(users)
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id}")))
    }

    async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(AppError::Database)?;

        Ok(user)
    }

    /// Create a new user with a hashed password
    pub async fn create_user(&self, new: &NewUser) -> Result<User> {
        let name = required(&new.name, "Name")?;
        let email = required(&new.email, "Email")?;
        let password = new
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::validation("Password is required"))?;
        let hash = password::hash_password(password)?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, state, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(hash)
        .bind(new.role.unwrap_or_default().as_str())
        .bind(new.state.unwrap_or_default().as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_unique_email)?;

        self.get_user_by_id(result.last_insert_rowid()).await
    }

    /// Apply a partial update; a supplied password is re-hashed
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let mut user = Self::find(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id}")))?;

        if let Some(name) = update.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            user.name = name.to_string();
        }
        if let Some(email) = update.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            user.email = email.to_string();
        }
        if let Some(password) = update.password.as_deref().filter(|p| !p.is_empty()) {
            user.password_hash = password::hash_password(password)?;
        }
        if let Some(state) = update.state {
            user.state = state;
        }
        if let Some(role) = update.role {
            let demoting = user.role == Role::Admin && role != Role::Admin;
            if demoting && Self::admin_count(&mut *tx).await? <= 1 {
                return Err(AppError::Conflict("Cannot demote the last admin".into()));
            }
            user.role = role;
        }

        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, password_hash = ?, role = ?, state = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.state.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_unique_email)?;

        tx.commit().await?;

        Ok(user)
    }

    /// Delete a user by ID
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let user = Self::find(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id}")))?;

        if user.role == Role::Admin && Self::admin_count(&mut *tx).await? <= 1 {
            return Err(AppError::Conflict("Cannot delete the last admin".into()));
        }

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user.id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await?;

        Ok(())
    }

    async fn admin_count(conn: &mut SqliteConnection) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(Role::Admin.as_str())
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("{field} is required")))
}

fn map_unique_email(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Email already in use".into())
        }
        _ => AppError::Database(err),
    }
}
