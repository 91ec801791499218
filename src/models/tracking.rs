use chrono::{DateTime, Utc};
use serde::Serialize;

use super::shipment::ShipmentStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub timestamp: DateTime<Utc>,
    pub description: &'static str,
    pub location: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedShipment {
    pub id: i64,
    pub tracking: Option<String>,
    pub status: ShipmentStatus,
    pub carrier: String,
    pub recipient_name: String,
    pub recipient_city: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackingTimelineResponse {
    pub shipment: TrackedShipment,
    pub events: Vec<TrackingEvent>,
}
