use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::report::{
        AVERAGE_DELIVERY_DAYS, DashboardKpis, Report, ReportPeriod, ReportTotals, success_rate,
    },
};

/// Aggregate queries behind the dashboard and the reports page
#[derive(Clone)]
pub struct ReportStore {
    pool: DbPool,
}

impl ReportStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn dashboard(&self, today: NaiveDate) -> Result<DashboardKpis> {
        let month_start = today.with_day(1).unwrap_or(today);
        let week_start = today - Duration::days(6);

        let mut kpis = sqlx::query_as::<_, DashboardKpis>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN date = ?1 AND status != 'Cancelled' THEN 1 ELSE 0 END), 0)
                    AS shipments_today,
                COALESCE(SUM(CASE WHEN status IN ('Shipped', 'In Transit', 'Out for Delivery') THEN 1 ELSE 0 END), 0)
                    AS in_transit,
                COALESCE(SUM(CASE WHEN status = 'Delivered' AND date >= ?2 THEN 1 ELSE 0 END), 0)
                    AS delivered_this_month,
                COALESCE(SUM(CASE WHEN status = 'On Hold' THEN 1 ELSE 0 END), 0)
                    AS on_hold,
                TOTAL(CASE WHEN cod_amount > 0 AND collection_status = 'Awaiting' AND status != 'Cancelled'
                    THEN cod_amount ELSE 0 END)
                    AS cod_awaiting_total,
                COALESCE(SUM(CASE WHEN date >= ?3 AND status != 'Cancelled' THEN 1 ELSE 0 END), 0)
                    AS shipments_this_week,
                COALESCE(SUM(CASE WHEN date >= ?2 AND status != 'Cancelled' THEN 1 ELSE 0 END), 0)
                    AS shipments_this_month
            FROM shipments
            "#,
        )
        .bind(today)
        .bind(month_start)
        .bind(week_start)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        kpis.average_delivery_days = AVERAGE_DELIVERY_DAYS;

        Ok(kpis)
    }

    pub async fn report(&self, period: ReportPeriod, today: NaiveDate) -> Result<Report> {
        let from = period.start_date(today);

        let totals = sqlx::query_as::<_, ReportTotals>(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'Delivered' THEN 1 ELSE 0 END), 0) AS delivered,
                COALESCE(SUM(CASE WHEN status = 'On Hold' THEN 1 ELSE 0 END), 0) AS on_hold,
                TOTAL(cost) AS total_cost
            FROM shipments
            WHERE date >= ? AND status != 'Cancelled'
            "#,
        )
        .bind(from)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let per_carrier: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT carrier, COUNT(*) FROM shipments
            WHERE date >= ? AND status != 'Cancelled' AND carrier != ''
            GROUP BY carrier
            "#,
        )
        .bind(from)
        .fetch_all(&self.pool)
        .await?;

        let per_day: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT date, COUNT(*) FROM shipments
            WHERE date >= ? AND status != 'Cancelled'
            GROUP BY date
            "#,
        )
        .bind(from)
        .fetch_all(&self.pool)
        .await?;

        Ok(Report {
            from,
            total_shipments: totals.total,
            delivered: totals.delivered,
            on_hold: totals.on_hold,
            success_rate: success_rate(totals.delivered, totals.total),
            total_cost: (totals.total_cost * 100.0).round() / 100.0,
            average_delivery_days: AVERAGE_DELIVERY_DAYS,
            per_carrier: per_carrier.into_iter().collect::<BTreeMap<_, _>>(),
            per_day: per_day.into_iter().collect::<BTreeMap<_, _>>(),
        })
    }
}
