use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::manifest::{Manifest, ManifestStatus, manifest_code},
};

const MANIFEST_COLUMNS: &str = "id, date, pickup_date, carrier, shipment_count, package_count, \
     total_weight, status, note, created_at";

/// Manifest store for database operations
#[derive(Clone)]
pub struct ManifestStore {
    pool: DbPool,
}

impl ManifestStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// List manifests, newest first
    pub async fn list(&self) -> Result<Vec<Manifest>> {
        let manifests = sqlx::query_as::<_, Manifest>(&format!(
            "SELECT {MANIFEST_COLUMNS} FROM manifests WHERE id IS NOT NULL ORDER BY seq DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(manifests)
    }

    pub async fn get(&self, id: &str) -> Result<Manifest> {
        sqlx::query_as::<_, Manifest>(&format!(
            "SELECT {MANIFEST_COLUMNS} FROM manifests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::not_found(format!("Manifest {id}")))
    }

    /// Insert a placeholder row and assign its code from the sequence.
    ///
    /// This is the first write of the batching transaction, so the
    /// connection holds the database write lock from here until commit.
    pub async fn reserve(
        conn: &mut SqliteConnection,
        carrier: &str,
        date: NaiveDate,
        pickup_date: NaiveDate,
        note: &str,
    ) -> Result<String> {
        let result = sqlx::query(
            r#"
            INSERT INTO manifests (date, pickup_date, carrier, note, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(date)
        .bind(pickup_date)
        .bind(carrier)
        .bind(note)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        let seq = result.last_insert_rowid();
        let code = manifest_code(seq);

        sqlx::query("UPDATE manifests SET id = ? WHERE seq = ?")
            .bind(&code)
            .bind(seq)
            .execute(&mut *conn)
            .await?;

        Ok(code)
    }

    /// Store the aggregate snapshot of a freshly batched manifest
    pub async fn finalize(
        conn: &mut SqliteConnection,
        id: &str,
        shipment_count: i64,
        package_count: i64,
        total_weight: f64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE manifests
            SET shipment_count = ?, package_count = ?, total_weight = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(shipment_count)
        .bind(package_count)
        .bind(total_weight)
        .bind(ManifestStatus::AwaitingPickup.as_str())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn set_status(
        conn: &mut SqliteConnection,
        id: &str,
        status: &ManifestStatus,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE manifests SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Manifest {id}")));
        }

        Ok(())
    }
}
