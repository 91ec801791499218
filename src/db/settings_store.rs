use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::{
        rate::{RateEntry, RateUpdate},
        settings::{
            SENDER_ADDRESS, SENDER_CITY, SENDER_EMAIL, SENDER_NAME, SENDER_PHONE,
            SENDER_POSTAL_CODE, SENDER_PROVINCE, SHOPIFY_ACCESS_TOKEN, SHOPIFY_ENABLED,
            SHOPIFY_SHOP_DOMAIN, Setting, ShopifyConfig, ShopifyStatus,
        },
        shipment::{Address, AddressPatch},
    },
    services::sources::{RateSource, SenderSource},
};

/// Key/value settings and the carrier rate table
#[derive(Clone)]
pub struct SettingsStore {
    pool: DbPool,
}

impl SettingsStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn all(&self) -> Result<Vec<Setting>> {
        let settings = sqlx::query_as::<_, Setting>("SELECT key, value, kind FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(settings)
    }

    async fn value(&self, key: &str) -> Result<String> {
        let value: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value.map(|(v,)| v).unwrap_or_default())
    }

    async fn put(conn: &mut SqliteConnection, key: &str, value: &str, kind: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, kind) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, kind = excluded.kind
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(kind)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Apply the supplied sender fields in one transaction
    pub async fn update_sender(&self, patch: &AddressPatch) -> Result<Address> {
        let fields = [
            (SENDER_NAME, &patch.name),
            (SENDER_ADDRESS, &patch.address),
            (SENDER_POSTAL_CODE, &patch.postal_code),
            (SENDER_CITY, &patch.city),
            (SENDER_PROVINCE, &patch.province),
            (SENDER_PHONE, &patch.phone),
            (SENDER_EMAIL, &patch.email),
        ];

        let mut tx = self.pool.begin().await?;
        for (key, value) in fields {
            if let Some(value) = value {
                Self::put(&mut *tx, key, value, "string").await?;
            }
        }
        tx.commit().await?;

        self.sender_profile().await
    }

    /// Replace settings rows from a backup in one transaction
    pub async fn restore(&self, settings: &[Setting]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for setting in settings {
            Self::put(&mut *tx, &setting.key, &setting.value, &setting.kind).await?;
        }
        tx.commit().await?;

        Ok(settings.len())
    }

    pub async fn rates(&self) -> Result<Vec<RateEntry>> {
        let rates = sqlx::query_as::<_, RateEntry>("SELECT * FROM rates ORDER BY carrier")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rates)
    }

    /// Create or edit the rate of one carrier
    pub async fn upsert_rate(&self, carrier: &str, update: &RateUpdate) -> Result<RateEntry> {
        let mut tx = self.pool.begin().await?;

        let mut rate = sqlx::query_as::<_, RateEntry>("SELECT * FROM rates WHERE carrier = ?")
            .bind(carrier)
            .fetch_optional(&mut *tx)
            .await?
            .unwrap_or_else(|| RateEntry::new(carrier));
        update.apply_to(&mut rate);

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO rates (carrier, base_fee, per_kg, cod_fee, insurance_pct, express_fee, active)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&rate.carrier)
        .bind(rate.base_fee)
        .bind(rate.per_kg)
        .bind(rate.cod_fee)
        .bind(rate.insurance_pct)
        .bind(rate.express_fee)
        .bind(rate.active)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Rate for {} updated", rate.carrier);

        Ok(rate)
    }

    pub async fn shopify_status(&self) -> Result<ShopifyStatus> {
        let enabled = self.value(SHOPIFY_ENABLED).await?;
        let shop_domain = self.value(SHOPIFY_SHOP_DOMAIN).await?;
        let token = self.value(SHOPIFY_ACCESS_TOKEN).await?;

        Ok(ShopifyStatus {
            enabled: matches!(enabled.as_str(), "1" | "true"),
            configured: !shop_domain.is_empty() && !token.is_empty(),
            shop_domain,
        })
    }

    pub async fn configure_shopify(&self, config: &ShopifyConfig) -> Result<ShopifyStatus> {
        let mut tx = self.pool.begin().await?;
        if let Some(domain) = &config.shop_domain {
            Self::put(&mut *tx, SHOPIFY_SHOP_DOMAIN, domain.trim(), "string").await?;
        }
        if let Some(token) = &config.access_token {
            Self::put(&mut *tx, SHOPIFY_ACCESS_TOKEN, token.trim(), "string").await?;
        }
        let enabled = if config.enabled { "1" } else { "0" };
        Self::put(&mut *tx, SHOPIFY_ENABLED, enabled, "boolean").await?;
        tx.commit().await?;

        self.shopify_status().await
    }
}

#[async_trait]
impl RateSource for SettingsStore {
    async fn rate(&self, carrier: &str) -> Result<Option<RateEntry>> {
        let rate = sqlx::query_as::<_, RateEntry>("SELECT * FROM rates WHERE carrier = ?")
            .bind(carrier)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rate)
    }

    async fn active_rates(&self) -> Result<Vec<RateEntry>> {
        let rates =
            sqlx::query_as::<_, RateEntry>("SELECT * FROM rates WHERE active = 1 ORDER BY carrier")
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database)?;

        Ok(rates)
    }
}

#[async_trait]
impl SenderSource for SettingsStore {
    async fn sender_profile(&self) -> Result<Address> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        let mut sender = Address::default();
        for (key, value) in rows {
            let field = match key.as_str() {
                SENDER_NAME => &mut sender.name,
                SENDER_ADDRESS => &mut sender.address,
                SENDER_POSTAL_CODE => &mut sender.postal_code,
                SENDER_CITY => &mut sender.city,
                SENDER_PROVINCE => &mut sender.province,
                SENDER_PHONE => &mut sender.phone,
                SENDER_EMAIL => &mut sender.email,
                _ => continue,
            };
            *field = value;
        }

        Ok(sender)
    }
}
