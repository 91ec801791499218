use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{
    address_book::AddressBookEntry, manifest::Manifest, rate::RateEntry, shipment::Address,
    shipment::Shipment,
};

pub const SENDER_NAME: &str = "sender_name";
pub const SENDER_ADDRESS: &str = "sender_address";
pub const SENDER_POSTAL_CODE: &str = "sender_postal_code";
pub const SENDER_CITY: &str = "sender_city";
pub const SENDER_PROVINCE: &str = "sender_province";
pub const SENDER_PHONE: &str = "sender_phone";
pub const SENDER_EMAIL: &str = "sender_email";
pub const SHOPIFY_ENABLED: &str = "shopify_enabled";
pub const SHOPIFY_SHOP_DOMAIN: &str = "shopify_shop_domain";
pub const SHOPIFY_ACCESS_TOKEN: &str = "shopify_access_token";

/// Settings seeded on first start: key, value, kind.
pub const DEFAULT_SETTINGS: [(&str, &str, &str); 10] = [
    (SENDER_NAME, "Shipping Desk", "string"),
    (SENDER_ADDRESS, "Via Esempio 1", "string"),
    (SENDER_POSTAL_CODE, "20100", "string"),
    (SENDER_CITY, "Milano", "string"),
    (SENDER_PROVINCE, "MI", "string"),
    (SENDER_PHONE, "", "string"),
    (SENDER_EMAIL, "info@example.com", "string"),
    (SHOPIFY_ENABLED, "0", "boolean"),
    (SHOPIFY_SHOP_DOMAIN, "", "string"),
    (SHOPIFY_ACCESS_TOKEN, "", "string"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsOverview {
    pub sender: Address,
    pub rates: Vec<RateEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyStatus {
    pub enabled: bool,
    pub configured: bool,
    pub shop_domain: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShopifyConfig {
    pub shop_domain: Option<String>,
    pub access_token: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StubResponse {
    pub success: bool,
    pub message: &'static str,
}

pub const BACKUP_FORMAT_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: &'static str,
    pub exported_at: DateTime<Utc>,
    pub data: BackupData,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub shipments: Vec<Shipment>,
    pub manifests: Vec<Manifest>,
    pub address_book: Vec<AddressBookEntry>,
    pub settings: Vec<Setting>,
    pub rates: Vec<RateEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestoreRequest {
    pub data: Option<RestoreData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestoreData {
    pub settings: Vec<Setting>,
}
