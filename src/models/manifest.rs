use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::shipment::Shipment;

/// Prefix of every manifest code, e.g. `DST-00042`.
pub const MANIFEST_CODE_PREFIX: &str = "DST";

pub fn manifest_code(sequence: i64) -> String {
    format!("{MANIFEST_CODE_PREFIX}-{sequence:05}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ManifestStatus {
    AwaitingPickup,
    PickedUp,
    Other(String),
}

impl ManifestStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ManifestStatus::AwaitingPickup => "Awaiting Pickup",
            ManifestStatus::PickedUp => "Picked Up",
            ManifestStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for ManifestStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Awaiting Pickup" => ManifestStatus::AwaitingPickup,
            "Picked Up" => ManifestStatus::PickedUp,
            _ => ManifestStatus::Other(raw),
        }
    }
}

impl From<ManifestStatus> for String {
    fn from(status: ManifestStatus) -> Self {
        match status {
            ManifestStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ManifestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch handoff of shipments to one carrier. Totals are a snapshot taken
/// when the batch was created.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub date: NaiveDate,
    pub pickup_date: NaiveDate,
    pub carrier: String,
    pub shipment_count: i64,
    pub package_count: i64,
    pub total_weight: f64,
    #[sqlx(try_from = "String")]
    pub status: ManifestStatus,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDetail {
    pub manifest: Manifest,
    pub shipments: Vec<Shipment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewManifest {
    pub carrier: Option<String>,
    pub shipment_ids: Option<Vec<i64>>,
    pub note: Option<String>,
    pub pickup_date: Option<NaiveDate>,
}

/// A shipment that passed the eligibility filter of a batch.
#[derive(Debug, Clone, FromRow)]
pub struct BatchCandidate {
    pub id: i64,
    pub packages: i64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchedShipment {
    pub id: i64,
    pub tracking: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSummary {
    pub id: String,
    pub carrier: String,
    pub shipment_count: i64,
    pub package_count: i64,
    pub total_weight: f64,
    pub shipments: Vec<BatchedShipment>,
    /// Requested ids left untouched because they were not eligible.
    pub excluded_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ManifestStatusUpdate {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestStatusChange {
    pub id: String,
    pub status: ManifestStatus,
    pub shipments_updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_codes_are_zero_padded() {
        assert_eq!(manifest_code(1), "DST-00001");
        assert_eq!(manifest_code(42), "DST-00042");
        assert_eq!(manifest_code(123456), "DST-123456");
    }

    #[test]
    fn manifest_status_keeps_custom_values() {
        assert_eq!(
            ManifestStatus::from("Picked Up".to_string()),
            ManifestStatus::PickedUp
        );
        let custom = ManifestStatus::from("Delayed".to_string());
        assert_eq!(custom.as_str(), "Delayed");
    }
}
