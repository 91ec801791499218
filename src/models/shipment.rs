use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::lenient;

/// Lifecycle state of a shipment.
///
/// Known states follow the chain `Processing → Shipped → In Transit →
/// Out for Delivery → Delivered`, with `On Hold` as a side state after a
/// failed delivery attempt. Any other stored value is kept verbatim as
/// `Unrecognized` so that rows written by older clients still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShipmentStatus {
    Processing,
    Shipped,
    InTransit,
    OutForDelivery,
    Delivered,
    OnHold,
    Cancelled,
    Unrecognized(String),
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ShipmentStatus::Processing => "Processing",
            ShipmentStatus::Shipped => "Shipped",
            ShipmentStatus::InTransit => "In Transit",
            ShipmentStatus::OutForDelivery => "Out for Delivery",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::OnHold => "On Hold",
            ShipmentStatus::Cancelled => "Cancelled",
            ShipmentStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ShipmentStatus::Unrecognized(_))
    }

    /// Position on the delivery chain, `None` for states outside it.
    pub fn milestone_rank(&self) -> Option<u8> {
        match self {
            ShipmentStatus::Processing => Some(0),
            ShipmentStatus::Shipped => Some(1),
            ShipmentStatus::InTransit => Some(2),
            ShipmentStatus::OutForDelivery => Some(3),
            ShipmentStatus::Delivered => Some(4),
            _ => None,
        }
    }

    /// Whether `next` is a natural successor of `self`.
    ///
    /// Manual edits are never rejected on this basis; callers use it to
    /// decide whether a change deserves a warning.
    pub fn can_transition_to(&self, next: &ShipmentStatus) -> bool {
        use ShipmentStatus::*;

        if self == next {
            return self.is_known();
        }

        match (self, next) {
            (Unrecognized(_), _) | (_, Unrecognized(_)) => false,
            (Cancelled, Processing) => true,
            (Cancelled, _) => false,
            (_, Cancelled) => true,
            (Processing, Shipped) => true,
            (Shipped, InTransit) => true,
            (InTransit, OutForDelivery) => true,
            (OutForDelivery, Delivered) | (OutForDelivery, OnHold) => true,
            (OnHold, Delivered) => true,
            _ => false,
        }
    }
}

impl From<String> for ShipmentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Processing" => ShipmentStatus::Processing,
            "Shipped" => ShipmentStatus::Shipped,
            "In Transit" => ShipmentStatus::InTransit,
            "Out for Delivery" => ShipmentStatus::OutForDelivery,
            "Delivered" => ShipmentStatus::Delivered,
            "On Hold" => ShipmentStatus::OnHold,
            "Cancelled" => ShipmentStatus::Cancelled,
            _ => ShipmentStatus::Unrecognized(raw),
        }
    }
}

impl From<&str> for ShipmentStatus {
    fn from(raw: &str) -> Self {
        ShipmentStatus::from(raw.to_string())
    }
}

impl From<ShipmentStatus> for String {
    fn from(status: ShipmentStatus) -> Self {
        match status {
            ShipmentStatus::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the cash-on-delivery amount has been remitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionStatus {
    Awaiting,
    Collected,
}

impl CollectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Awaiting => "Awaiting",
            CollectionStatus::Collected => "Collected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Awaiting" => Some(CollectionStatus::Awaiting),
            "Collected" => Some(CollectionStatus::Collected),
            _ => None,
        }
    }
}

/// Address snapshot for either party of a shipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub province: String,
    pub phone: String,
    pub email: String,
}

/// Partial address used by update requests; only non-empty values apply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelDetails {
    pub packages: i64,
    pub weight: f64,
    pub volume: f64,
    pub cod_amount: f64,
    pub insured: bool,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: i64,
    pub date: NaiveDate,
    pub carrier: String,
    pub status: ShipmentStatus,
    pub sender: Address,
    pub recipient: Address,
    pub details: ParcelDetails,
    pub tracking: Option<String>,
    pub collection_status: Option<CollectionStatus>,
    pub collection_date: Option<NaiveDate>,
    pub collection_note: Option<String>,
    pub cost: f64,
    pub manifest_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat row of the `shipments` table.
#[derive(Debug, Clone, FromRow)]
pub struct ShipmentRow {
    pub id: i64,
    pub date: NaiveDate,
    pub carrier: String,
    pub status: String,
    pub sender_name: String,
    pub sender_address: String,
    pub sender_postal_code: String,
    pub sender_city: String,
    pub sender_province: String,
    pub sender_phone: String,
    pub sender_email: String,
    pub recipient_name: String,
    pub recipient_address: String,
    pub recipient_postal_code: String,
    pub recipient_city: String,
    pub recipient_province: String,
    pub recipient_phone: String,
    pub recipient_email: String,
    pub packages: i64,
    pub weight: f64,
    pub volume: f64,
    pub cod_amount: f64,
    pub insured: bool,
    pub note: String,
    pub tracking: Option<String>,
    pub collection_status: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub collection_note: Option<String>,
    pub cost: f64,
    pub manifest_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShipmentRow> for Shipment {
    fn from(row: ShipmentRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            carrier: row.carrier,
            status: ShipmentStatus::from(row.status),
            sender: Address {
                name: row.sender_name,
                address: row.sender_address,
                postal_code: row.sender_postal_code,
                city: row.sender_city,
                province: row.sender_province,
                phone: row.sender_phone,
                email: row.sender_email,
            },
            recipient: Address {
                name: row.recipient_name,
                address: row.recipient_address,
                postal_code: row.recipient_postal_code,
                city: row.recipient_city,
                province: row.recipient_province,
                phone: row.recipient_phone,
                email: row.recipient_email,
            },
            details: ParcelDetails {
                packages: row.packages,
                weight: row.weight,
                volume: row.volume,
                cod_amount: row.cod_amount,
                insured: row.insured,
                note: row.note,
            },
            tracking: row.tracking,
            collection_status: row.collection_status.as_deref().and_then(CollectionStatus::parse),
            collection_date: row.collection_date,
            collection_note: row.collection_note,
            cost: row.cost,
            manifest_id: row.manifest_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fully resolved values of a shipment about to be inserted.
#[derive(Debug, Clone)]
pub struct ShipmentDraft {
    pub date: NaiveDate,
    pub carrier: String,
    pub sender: Address,
    pub recipient: Address,
    pub details: ParcelDetails,
    pub cost: f64,
}

/// Parcel attributes as submitted by clients. Numbers may arrive as JSON
/// numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParcelInput {
    pub carrier: Option<String>,
    #[serde(deserialize_with = "lenient::integer")]
    pub packages: Option<i64>,
    #[serde(deserialize_with = "lenient::number")]
    pub weight: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub volume: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub cod_amount: Option<f64>,
    #[serde(deserialize_with = "lenient::flag")]
    pub insured: Option<bool>,
    pub note: Option<String>,
}

/// Payload of the create operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewShipment {
    pub sender: Option<Address>,
    pub recipient: Option<Address>,
    pub details: Option<ParcelInput>,
}

/// Payload of the partial update operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShipmentUpdate {
    pub status: Option<String>,
    pub carrier: Option<String>,
    pub tracking: Option<String>,
    pub recipient: Option<AddressPatch>,
    pub details: Option<ParcelInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedShipment {
    pub id: i64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentFilter {
    #[default]
    Active,
    Cancelled,
    All,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentListParams {
    #[serde(default)]
    pub filter: ShipmentFilter,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AffectedRows {
    pub count: u64,
}
