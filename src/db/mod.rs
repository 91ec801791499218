use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use crate::{
    models::{rate::DEFAULT_RATES, settings::DEFAULT_SETTINGS},
    services::password,
};

pub mod address_book_store;
pub mod collection_store;
pub mod manifest_store;
pub mod notification_store;
pub mod report_store;
pub mod settings_store;
pub mod shipment_store;
pub mod user_store;

pub type DbPool = Pool<Sqlite>;

pub const DEFAULT_ADMIN_NAME: &str = "Administrator";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid database url {database_url}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    // Create the parent directory of a file database if needed
    if let Some(dir) = options.get_filename().parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create database directory {}", dir.display()))?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await?;

    setup_database(&pool).await?;

    Ok(pool)
}

/// Set up the database schema and seed defaults
async fn setup_database(pool: &DbPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    for (carrier, base_fee, per_kg, cod_fee, insurance_pct, express_fee) in DEFAULT_RATES {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO rates (carrier, base_fee, per_kg, cod_fee, insurance_pct, express_fee, active)
            VALUES (?, ?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(carrier)
        .bind(base_fee)
        .bind(per_kg)
        .bind(cod_fee)
        .bind(insurance_pct)
        .bind(express_fee)
        .execute(pool)
        .await?;
    }

    for (key, value, kind) in DEFAULT_SETTINGS {
        sqlx::query("INSERT OR IGNORE INTO settings (key, value, kind) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(kind)
            .execute(pool)
            .await?;
    }

    // Add an admin account if the table is empty
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if count.0 == 0 {
        let hash = password::hash_password(DEFAULT_ADMIN_PASSWORD)?;
        sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, state, created_at)
            VALUES (?, ?, ?, 'admin', 'active', ?)
            "#,
        )
        .bind(DEFAULT_ADMIN_NAME)
        .bind(DEFAULT_ADMIN_EMAIL)
        .bind(hash)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        tracing::info!("Seeded default admin account {}", DEFAULT_ADMIN_EMAIL);
    }

    Ok(())
}

const SCHEMA: [&str; 14] = [
    r#"
    CREATE TABLE IF NOT EXISTS shipments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        carrier TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'Processing',
        sender_name TEXT NOT NULL DEFAULT '',
        sender_address TEXT NOT NULL DEFAULT '',
        sender_postal_code TEXT NOT NULL DEFAULT '',
        sender_city TEXT NOT NULL DEFAULT '',
        sender_province TEXT NOT NULL DEFAULT '',
        sender_phone TEXT NOT NULL DEFAULT '',
        sender_email TEXT NOT NULL DEFAULT '',
        recipient_name TEXT NOT NULL,
        recipient_address TEXT NOT NULL DEFAULT '',
        recipient_postal_code TEXT NOT NULL DEFAULT '',
        recipient_city TEXT NOT NULL DEFAULT '',
        recipient_province TEXT NOT NULL DEFAULT '',
        recipient_phone TEXT NOT NULL DEFAULT '',
        recipient_email TEXT NOT NULL DEFAULT '',
        packages INTEGER NOT NULL DEFAULT 1,
        weight REAL NOT NULL DEFAULT 1,
        volume REAL NOT NULL DEFAULT 0,
        cod_amount REAL NOT NULL DEFAULT 0,
        insured BOOLEAN NOT NULL DEFAULT 0,
        note TEXT NOT NULL DEFAULT '',
        tracking TEXT,
        collection_status TEXT,
        collection_date TEXT,
        collection_note TEXT,
        cost REAL NOT NULL DEFAULT 0,
        manifest_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS manifests (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT UNIQUE,
        date TEXT NOT NULL,
        pickup_date TEXT NOT NULL,
        carrier TEXT NOT NULL,
        shipment_count INTEGER NOT NULL DEFAULT 0,
        package_count INTEGER NOT NULL DEFAULT 0,
        total_weight REAL NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'Awaiting Pickup',
        note TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS address_book (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        address TEXT NOT NULL DEFAULT '',
        postal_code TEXT NOT NULL DEFAULT '',
        city TEXT NOT NULL DEFAULT '',
        province TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        shipment_count INTEGER NOT NULL DEFAULT 0,
        last_shipment TEXT,
        note TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'operator',
        state TEXT NOT NULL DEFAULT 'active',
        last_access TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        kind TEXT NOT NULL DEFAULT 'string'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS rates (
        carrier TEXT PRIMARY KEY NOT NULL,
        base_fee REAL NOT NULL DEFAULT 0,
        per_kg REAL NOT NULL DEFAULT 0,
        cod_fee REAL NOT NULL DEFAULT 0,
        insurance_pct REAL NOT NULL DEFAULT 0,
        express_fee REAL NOT NULL DEFAULT 0,
        active BOOLEAN NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL,
        icon TEXT NOT NULL,
        colour TEXT NOT NULL,
        message TEXT NOT NULL,
        is_read BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_shipments_status ON shipments(status)",
    "CREATE INDEX IF NOT EXISTS idx_shipments_carrier ON shipments(carrier)",
    "CREATE INDEX IF NOT EXISTS idx_shipments_date ON shipments(date)",
    "CREATE INDEX IF NOT EXISTS idx_shipments_manifest ON shipments(manifest_id)",
    "CREATE INDEX IF NOT EXISTS idx_shipments_recipient ON shipments(recipient_name)",
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_shipments_tracking
        ON shipments(tracking COLLATE NOCASE) WHERE tracking IS NOT NULL
    "#,
    "CREATE INDEX IF NOT EXISTS idx_notifications_created ON notifications(created_at)",
];
