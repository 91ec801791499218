use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    models::collection::{ConfirmCollection, LedgerParams},
    state::AppState,
};

/// Cash-on-delivery ledger with its summary slices
pub async fn ledger(
    State(state): State<AppState>,
    Query(params): Query<LedgerParams>,
) -> Result<impl IntoResponse> {
    let ledger = state.collections.ledger(params.filter).await?;
    Ok((StatusCode::OK, Json(ledger)))
}

pub async fn confirm_collection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<ConfirmCollection>>,
) -> Result<impl IntoResponse> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let receipt = state.shipments.confirm_collection(id, request).await?;
    Ok((StatusCode::OK, Json(receipt)))
}
