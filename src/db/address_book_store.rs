use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::address_book::{AddressBookEntry, AddressBookSort, NewAddressBookEntry},
};

/// Address book store for database operations
#[derive(Clone)]
pub struct AddressBookStore {
    pool: DbPool,
}

impl AddressBookStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List entries, optionally filtered on name, city or phone
    pub async fn list(
        &self,
        search: Option<&str>,
        sort: AddressBookSort,
    ) -> Result<Vec<AddressBookEntry>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM address_book");

        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{term}%");
            builder.push(" WHERE name LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR city LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR phone LIKE ");
            builder.push_bind(pattern);
        }

        builder.push(match sort {
            AddressBookSort::Name => " ORDER BY name COLLATE NOCASE ASC",
            AddressBookSort::Frequent => " ORDER BY shipment_count DESC, name COLLATE NOCASE ASC",
            AddressBookSort::Recent => " ORDER BY last_shipment IS NULL, last_shipment DESC, id DESC",
        });

        let entries = builder
            .build_query_as::<AddressBookEntry>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(entries)
    }

    pub async fn get(&self, id: i64) -> Result<AddressBookEntry> {
        sqlx::query_as::<_, AddressBookEntry>("SELECT * FROM address_book WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found(format!("Address book entry {id}")))
    }

    pub async fn create(&self, entry: &NewAddressBookEntry) -> Result<i64> {
        let name = entry
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::validation("Name is required"))?;

        let result = sqlx::query(
            r#"
            INSERT INTO address_book (name, address, postal_code, city, province, phone, email, note, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(entry.address.as_deref().unwrap_or_default())
        .bind(entry.postal_code.as_deref().unwrap_or_default())
        .bind(entry.city.as_deref().unwrap_or_default())
        .bind(entry.province.as_deref().unwrap_or_default())
        .bind(entry.phone.as_deref().unwrap_or_default())
        .bind(entry.email.as_deref().unwrap_or_default())
        .bind(entry.note.as_deref().unwrap_or_default())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.last_insert_rowid())
    }

    /// Overwrite only the supplied fields
    pub async fn update(&self, id: i64, patch: &NewAddressBookEntry) -> Result<AddressBookEntry> {
        if matches!(patch.name.as_deref().map(str::trim), Some("")) {
            return Err(AppError::validation("Name cannot be empty"));
        }

        let fields = [
            ("name", &patch.name),
            ("address", &patch.address),
            ("postal_code", &patch.postal_code),
            ("city", &patch.city),
            ("province", &patch.province),
            ("phone", &patch.phone),
            ("email", &patch.email),
            ("note", &patch.note),
        ];

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE address_book SET ");
        let mut separated = builder.separated(", ");
        let mut changed = false;
        for (column, value) in fields {
            if let Some(value) = value {
                separated.push(format!("{column} = "));
                separated.push_bind_unseparated(value.trim().to_string());
                changed = true;
            }
        }

        if changed {
            builder.push(" WHERE id = ");
            builder.push_bind(id);
            let result = builder
                .build()
                .execute(&self.pool)
                .await
                .map_err(AppError::Database)?;
            if result.rows_affected() == 0 {
                return Err(AppError::not_found(format!("Address book entry {id}")));
            }
        }

        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM address_book WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Address book entry {id}")));
        }

        Ok(())
    }

    /// Bump the usage counters of entries named exactly like a new recipient
    pub async fn record_shipment(
        conn: &mut SqliteConnection,
        name: &str,
        date: NaiveDate,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE address_book SET shipment_count = shipment_count + 1, last_shipment = ? WHERE name = ?",
        )
        .bind(date)
        .bind(name)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn all(&self) -> Result<Vec<AddressBookEntry>> {
        self.list(None, AddressBookSort::Name).await
    }
}
