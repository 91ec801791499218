use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// No delivery timestamps are recorded, so the average is a fixed estimate.
pub const AVERAGE_DELIVERY_DAYS: f64 = 2.3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    pub shipments_today: i64,
    pub in_transit: i64,
    pub delivered_this_month: i64,
    pub on_hold: i64,
    pub cod_awaiting_total: f64,
    pub shipments_this_week: i64,
    pub shipments_this_month: i64,
    #[sqlx(skip)]
    pub average_delivery_days: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Week,
    #[default]
    Month,
    Year,
}

impl ReportPeriod {
    pub fn start_date(&self, today: NaiveDate) -> NaiveDate {
        match self {
            ReportPeriod::Week => today - Duration::days(7),
            ReportPeriod::Month => today.with_day(1).unwrap_or(today),
            ReportPeriod::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub period: ReportPeriod,
}

#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct ReportTotals {
    pub total: i64,
    pub delivered: i64,
    pub on_hold: i64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub from: NaiveDate,
    pub total_shipments: i64,
    pub delivered: i64,
    pub on_hold: i64,
    /// Delivered over total, as a rounded percentage.
    pub success_rate: i64,
    pub total_cost: f64,
    pub average_delivery_days: f64,
    pub per_carrier: BTreeMap<String, i64>,
    pub per_day: BTreeMap<String, i64>,
}

pub fn success_rate(delivered: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((delivered as f64 / total as f64) * 100.0).round() as i64
}
