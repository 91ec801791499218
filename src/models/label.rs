use chrono::NaiveDate;
use serde::Serialize;

use super::shipment::{Address, Shipment};

/// Printable content of a shipping label. Rendering is left to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLabel {
    pub title: String,
    pub tracking: String,
    pub carrier: String,
    pub recipient: Address,
    pub sender: Address,
    pub packages: i64,
    pub weight: f64,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cod_amount: Option<f64>,
}

impl From<&Shipment> for ShippingLabel {
    fn from(shipment: &Shipment) -> Self {
        let title = if shipment.sender.name.is_empty() {
            "SHIPPING LABEL".to_string()
        } else {
            shipment.sender.name.to_uppercase()
        };

        Self {
            title,
            tracking: shipment
                .tracking
                .clone()
                .unwrap_or_else(|| format!("TRK-{}", shipment.id)),
            carrier: if shipment.carrier.is_empty() {
                "N.D.".to_string()
            } else {
                shipment.carrier.clone()
            },
            recipient: shipment.recipient.clone(),
            sender: shipment.sender.clone(),
            packages: shipment.details.packages,
            weight: shipment.details.weight,
            date: shipment.date,
            cod_amount: (shipment.details.cod_amount > 0.0).then_some(shipment.details.cod_amount),
        }
    }
}
