use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::lenient;

/// Pricing parameters of one carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RateEntry {
    pub carrier: String,
    pub base_fee: f64,
    pub per_kg: f64,
    pub cod_fee: f64,
    /// Percentage applied to the running cost when the parcel is insured.
    pub insurance_pct: f64,
    pub express_fee: f64,
    pub active: bool,
}

impl RateEntry {
    pub fn new(carrier: &str) -> Self {
        Self {
            carrier: carrier.to_string(),
            base_fee: 0.0,
            per_kg: 0.0,
            cod_fee: 0.0,
            insurance_pct: 0.0,
            express_fee: 0.0,
            active: true,
        }
    }
}

/// Rates seeded on first start: carrier, base, per kg, cod, insurance %, express.
pub const DEFAULT_RATES: [(&str, f64, f64, f64, f64, f64); 6] = [
    ("BRT", 5.50, 0.80, 2.50, 1.5, 5.00),
    ("GLS", 5.80, 0.75, 2.80, 1.8, 4.50),
    ("SDA", 5.20, 0.85, 2.30, 1.6, 5.50),
    ("DHL", 8.50, 1.20, 3.50, 2.0, 8.00),
    ("UPS", 9.00, 1.30, 3.80, 2.2, 9.00),
    ("Poste Italiane", 4.50, 0.60, 2.00, 1.2, 3.50),
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateUpdate {
    #[serde(deserialize_with = "lenient::number")]
    pub base_fee: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub per_kg: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub cod_fee: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub insurance_pct: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub express_fee: Option<f64>,
    #[serde(deserialize_with = "lenient::flag")]
    pub active: Option<bool>,
}

impl RateUpdate {
    pub fn apply_to(&self, rate: &mut RateEntry) {
        if let Some(v) = self.base_fee {
            rate.base_fee = v;
        }
        if let Some(v) = self.per_kg {
            rate.per_kg = v;
        }
        if let Some(v) = self.cod_fee {
            rate.cod_fee = v;
        }
        if let Some(v) = self.insurance_pct {
            rate.insurance_pct = v;
        }
        if let Some(v) = self.express_fee {
            rate.express_fee = v;
        }
        if let Some(v) = self.active {
            rate.active = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteRequest {
    #[serde(deserialize_with = "lenient::number")]
    pub weight: Option<f64>,
    #[serde(deserialize_with = "lenient::integer")]
    pub packages: Option<i64>,
    #[serde(deserialize_with = "lenient::number")]
    pub cod_amount: Option<f64>,
    #[serde(deserialize_with = "lenient::flag")]
    pub insured: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    pub express: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    pub carrier: String,
    pub cost: f64,
    pub eta_window: &'static str,
}
