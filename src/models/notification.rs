use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub kind: String,
    pub icon: String,
    pub colour: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: &'static str,
    pub icon: &'static str,
    pub colour: &'static str,
    pub message: String,
}

impl NewNotification {
    pub fn shipment_created(id: i64) -> Self {
        Self {
            kind: "shipment",
            icon: "bi-box-seam",
            colour: "primary",
            message: format!("New shipment #{id} created"),
        }
    }

    pub fn manifest_created(code: &str, shipment_count: i64) -> Self {
        Self {
            kind: "manifest",
            icon: "bi-file-earmark-check",
            colour: "info",
            message: format!("Manifest {code} created with {shipment_count} shipments"),
        }
    }

    pub fn collection_confirmed(id: i64, amount: f64) -> Self {
        Self {
            kind: "collection",
            icon: "bi-cash-coin",
            colour: "success",
            message: format!("Collected cash on delivery for #{id} - €{amount:.2}"),
        }
    }
}
