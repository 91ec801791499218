use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::notification::{NewNotification, Notification},
};

/// How many notifications the feed returns.
pub const FEED_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct NotificationStore {
    pool: DbPool,
}

impl NotificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append a notification and return the stored row
    pub async fn insert(conn: &mut SqliteConnection, new: &NewNotification) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (kind, icon, colour, message, is_read, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            RETURNING id, kind, icon, colour, message, is_read, created_at
            "#,
        )
        .bind(new.kind)
        .bind(new.icon)
        .bind(new.colour)
        .bind(&new.message)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        Ok(notification)
    }

    pub async fn latest(&self) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(FEED_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(notifications)
    }

    pub async fn mark_all_read(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE is_read = 0")
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Notification {id}")));
        }

        Ok(())
    }
}
