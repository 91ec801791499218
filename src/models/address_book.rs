use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::shipment::Shipment;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AddressBookEntry {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub province: String,
    pub phone: String,
    pub email: String,
    pub shipment_count: i64,
    pub last_shipment: Option<NaiveDate>,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddressBookDetail {
    pub entry: AddressBookEntry,
    /// Latest shipments whose recipient name matches exactly.
    pub shipments: Vec<Shipment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewAddressBookEntry {
    pub name: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressBookSort {
    #[default]
    Name,
    Frequent,
    Recent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddressBookParams {
    pub search: Option<String>,
    pub sort: AddressBookSort,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedEntry {
    pub id: i64,
}
