use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{error::Result, models::report::ReportParams, state::AppState};

pub async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let kpis = state.reports.dashboard(Utc::now().date_naive()).await?;
    Ok((StatusCode::OK, Json(kpis)))
}

pub async fn report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse> {
    let report = state
        .reports
        .report(params.period, Utc::now().date_naive())
        .await?;
    Ok((StatusCode::OK, Json(report)))
}
