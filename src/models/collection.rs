use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::shipment::{CollectionStatus, ShipmentStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerFilter {
    #[default]
    All,
    Awaiting,
    InTransit,
    Collected,
    Expired,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerParams {
    #[serde(default)]
    pub filter: LedgerFilter,
}

#[derive(Debug, Clone, FromRow)]
pub struct CollectionRow {
    pub id: i64,
    pub date: NaiveDate,
    pub carrier: String,
    pub status: String,
    pub recipient_name: String,
    pub recipient_city: String,
    pub cod_amount: f64,
    pub collection_status: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub tracking: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub carrier: String,
    pub status: ShipmentStatus,
    pub recipient_name: String,
    pub recipient_city: String,
    pub cod_amount: f64,
    pub collection_status: Option<CollectionStatus>,
    pub collection_date: Option<NaiveDate>,
    pub tracking: Option<String>,
}

impl From<CollectionRow> for CollectionEntry {
    fn from(row: CollectionRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            carrier: row.carrier,
            status: ShipmentStatus::from(row.status),
            recipient_name: row.recipient_name,
            recipient_city: row.recipient_city,
            cod_amount: row.cod_amount,
            collection_status: row.collection_status.as_deref().and_then(CollectionStatus::parse),
            collection_date: row.collection_date,
            tracking: row.tracking,
        }
    }
}

/// Count and currency sum of one ledger slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, FromRow)]
pub struct SliceTotal {
    pub count: i64,
    pub total: f64,
}

/// Slices are computed independently and may overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub awaiting: SliceTotal,
    pub in_transit: SliceTotal,
    pub collected: SliceTotal,
    pub expired: SliceTotal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionLedger {
    pub entries: Vec<CollectionEntry>,
    pub stats: LedgerStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfirmCollection {
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReceipt {
    pub id: i64,
    pub amount: f64,
    pub collection_date: NaiveDate,
    pub message: String,
}
