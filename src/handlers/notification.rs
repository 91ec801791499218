use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{error::Result, models::shipment::AffectedRows, state::AppState};

pub async fn list_notifications(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let notifications = state.feed.latest().await?;
    Ok((StatusCode::OK, Json(notifications)))
}

pub async fn mark_all_read(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let count = state.feed.mark_all_read().await?;
    Ok((StatusCode::OK, Json(AffectedRows { count })))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.feed.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
