use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::{
        manifest::BatchCandidate,
        shipment::{CollectionStatus, Shipment, ShipmentDraft, ShipmentFilter, ShipmentRow},
    },
};

/// Shipment store for database operations
#[derive(Clone)]
pub struct ShipmentStore {
    pool: DbPool,
}

impl ShipmentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// List shipments, newest first
    pub async fn list(&self, filter: ShipmentFilter) -> Result<Vec<Shipment>> {
        let sql = match filter {
            ShipmentFilter::Active => {
                "SELECT * FROM shipments WHERE status != 'Cancelled' ORDER BY id DESC"
            }
            ShipmentFilter::Cancelled => {
                "SELECT * FROM shipments WHERE status = 'Cancelled' ORDER BY id DESC"
            }
            ShipmentFilter::All => "SELECT * FROM shipments ORDER BY id DESC",
        };

        let rows = sqlx::query_as::<_, ShipmentRow>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(Shipment::from).collect())
    }

    pub async fn get(&self, id: i64) -> Result<Shipment> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Shipment {id}")))
    }

    pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Shipment>> {
        let row = sqlx::query_as::<_, ShipmentRow>("SELECT * FROM shipments WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(AppError::Database)?;

        Ok(row.map(Shipment::from))
    }

    /// Case-insensitive lookup on the tracking code
    pub async fn find_by_tracking(&self, code: &str) -> Result<Option<Shipment>> {
        let row = sqlx::query_as::<_, ShipmentRow>(
            "SELECT * FROM shipments WHERE tracking = ? COLLATE NOCASE",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(Shipment::from))
    }

    pub async fn tracking_exists(conn: &mut SqliteConnection, code: &str) -> Result<bool> {
        let found: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM shipments WHERE tracking = ? COLLATE NOCASE")
                .bind(code)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(found.is_some())
    }

    /// Insert a new shipment in `Processing` and return its id
    pub async fn insert(conn: &mut SqliteConnection, draft: &ShipmentDraft) -> Result<i64> {
        let now = Utc::now();
        let collection_status =
            (draft.details.cod_amount > 0.0).then_some(CollectionStatus::Awaiting.as_str());

        let result = sqlx::query(
            r#"
            INSERT INTO shipments (
                date, carrier, status,
                sender_name, sender_address, sender_postal_code, sender_city,
                sender_province, sender_phone, sender_email,
                recipient_name, recipient_address, recipient_postal_code, recipient_city,
                recipient_province, recipient_phone, recipient_email,
                packages, weight, volume, cod_amount, insured, note,
                collection_status, cost, created_at, updated_at
            )
            VALUES (?, ?, 'Processing', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.date)
        .bind(&draft.carrier)
        .bind(&draft.sender.name)
        .bind(&draft.sender.address)
        .bind(&draft.sender.postal_code)
        .bind(&draft.sender.city)
        .bind(&draft.sender.province)
        .bind(&draft.sender.phone)
        .bind(&draft.sender.email)
        .bind(&draft.recipient.name)
        .bind(&draft.recipient.address)
        .bind(&draft.recipient.postal_code)
        .bind(&draft.recipient.city)
        .bind(&draft.recipient.province)
        .bind(&draft.recipient.phone)
        .bind(&draft.recipient.email)
        .bind(draft.details.packages)
        .bind(draft.details.weight)
        .bind(draft.details.volume)
        .bind(draft.details.cod_amount)
        .bind(draft.details.insured)
        .bind(&draft.details.note)
        .bind(collection_status)
        .bind(draft.cost)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        Ok(result.last_insert_rowid())
    }

    /// Write back every mutable column of an edited shipment
    pub async fn save(conn: &mut SqliteConnection, shipment: &Shipment) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE shipments
            SET carrier = ?, status = ?, tracking = ?,
                recipient_name = ?, recipient_address = ?, recipient_postal_code = ?,
                recipient_city = ?, recipient_province = ?, recipient_phone = ?,
                recipient_email = ?,
                packages = ?, weight = ?, volume = ?, cod_amount = ?, insured = ?, note = ?,
                collection_status = ?, collection_date = ?, collection_note = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&shipment.carrier)
        .bind(shipment.status.as_str())
        .bind(&shipment.tracking)
        .bind(&shipment.recipient.name)
        .bind(&shipment.recipient.address)
        .bind(&shipment.recipient.postal_code)
        .bind(&shipment.recipient.city)
        .bind(&shipment.recipient.province)
        .bind(&shipment.recipient.phone)
        .bind(&shipment.recipient.email)
        .bind(shipment.details.packages)
        .bind(shipment.details.weight)
        .bind(shipment.details.volume)
        .bind(shipment.details.cod_amount)
        .bind(shipment.details.insured)
        .bind(&shipment.details.note)
        .bind(shipment.collection_status.map(|s| s.as_str()))
        .bind(shipment.collection_date)
        .bind(&shipment.collection_note)
        .bind(Utc::now())
        .bind(shipment.id)
        .execute(&mut *conn)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Tracking code already in use".into())
            }
            _ => AppError::Database(e),
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Shipment {}", shipment.id)));
        }

        Ok(())
    }

    /// Move a shipment to `Cancelled`, keeping the row
    pub async fn soft_delete(&self, id: i64) -> Result<()> {
        let result =
            sqlx::query("UPDATE shipments SET status = 'Cancelled', updated_at = ? WHERE id = ?")
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Shipment {id}")));
        }

        Ok(())
    }

    /// Bring a cancelled shipment back to `Processing`. Returns whether a row changed.
    pub async fn restore(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE shipments SET status = 'Processing', updated_at = ? WHERE id = ? AND status = 'Cancelled'",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// Cancel every listed shipment in one transaction
    pub async fn bulk_soft_delete(&self, ids: &[i64]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE shipments SET status = 'Cancelled', updated_at = ");
        builder.push_bind(Utc::now());
        builder.push(" WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    /// Permanently delete every cancelled shipment
    pub async fn purge_cancelled(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM shipments WHERE status = 'Cancelled'")
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    /// Subset of `ids` that may join a manifest for `carrier`
    pub async fn eligible_for_batch(
        conn: &mut SqliteConnection,
        carrier: &str,
        ids: &[i64],
    ) -> Result<Vec<BatchCandidate>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, packages, weight FROM shipments \
             WHERE status = 'Processing' AND carrier = ",
        );
        builder.push_bind(carrier);
        builder.push(" AND id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY id");

        let candidates = builder
            .build_query_as::<BatchCandidate>()
            .fetch_all(&mut *conn)
            .await?;

        Ok(candidates)
    }

    pub async fn mark_shipped(
        conn: &mut SqliteConnection,
        id: i64,
        manifest_id: &str,
        tracking: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE shipments
            SET status = 'Shipped', manifest_id = ?, tracking = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(manifest_id)
        .bind(tracking)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn mark_in_transit_for_manifest(
        conn: &mut SqliteConnection,
        manifest_id: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE shipments SET status = 'In Transit', updated_at = ? WHERE manifest_id = ?",
        )
        .bind(Utc::now())
        .bind(manifest_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn by_manifest(&self, manifest_id: &str) -> Result<Vec<Shipment>> {
        let rows = sqlx::query_as::<_, ShipmentRow>(
            "SELECT * FROM shipments WHERE manifest_id = ? ORDER BY id",
        )
        .bind(manifest_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Shipment::from).collect())
    }

    /// Shipments that could still be batched for `carrier`
    pub async fn available_for_carrier(&self, carrier: &str) -> Result<Vec<Shipment>> {
        let rows = sqlx::query_as::<_, ShipmentRow>(
            r#"
            SELECT * FROM shipments
            WHERE carrier = ? AND status = 'Processing'
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(carrier)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Shipment::from).collect())
    }

    /// Latest shipments addressed to exactly `name`
    pub async fn history_for_recipient(&self, name: &str, limit: i64) -> Result<Vec<Shipment>> {
        let rows = sqlx::query_as::<_, ShipmentRow>(
            "SELECT * FROM shipments WHERE recipient_name = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Shipment::from).collect())
    }

    /// Record a cash-on-delivery remittance
    pub async fn confirm_collection(
        conn: &mut SqliteConnection,
        id: i64,
        date: NaiveDate,
        note: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE shipments
            SET collection_status = 'Collected', collection_date = ?, collection_note = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(date)
        .bind(note)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Shipment {id}")));
        }

        Ok(())
    }
}
