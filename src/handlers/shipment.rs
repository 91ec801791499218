use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    models::{
        rate::QuoteRequest,
        shipment::{BulkDeleteRequest, NewShipment, ShipmentListParams, ShipmentUpdate},
    },
    state::AppState,
};

/// List shipments, active ones by default
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(params): Query<ShipmentListParams>,
) -> Result<impl IntoResponse> {
    let shipments = state.shipments.list(params.filter).await?;
    Ok((StatusCode::OK, Json(shipments)))
}

pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let shipment = state.shipments.get(id).await?;
    Ok((StatusCode::OK, Json(shipment)))
}

pub async fn create_shipment(
    State(state): State<AppState>,
    Json(payload): Json<NewShipment>,
) -> Result<impl IntoResponse> {
    let created = state.shipments.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<ShipmentUpdate>,
) -> Result<impl IntoResponse> {
    let shipment = state.shipments.update(id, update).await?;
    Ok((StatusCode::OK, Json(shipment)))
}

/// Soft delete: the shipment moves to `Cancelled`
pub async fn delete_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.shipments.soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let shipment = state.shipments.restore(id).await?;
    Ok((StatusCode::OK, Json(shipment)))
}

pub async fn bulk_delete(
    State(state): State<AppState>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<impl IntoResponse> {
    let affected = state.shipments.bulk_soft_delete(request.ids).await?;
    Ok((StatusCode::OK, Json(affected)))
}

pub async fn purge_cancelled(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let affected = state.shipments.purge_cancelled().await?;
    Ok((StatusCode::OK, Json(affected)))
}

pub async fn get_label(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let label = state.shipments.label(id).await?;
    Ok((StatusCode::OK, Json(label)))
}

pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<impl IntoResponse> {
    let lines = state.shipments.quote(request).await?;
    Ok((StatusCode::OK, Json(lines)))
}

pub async fn tracking(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    let timeline = state.shipments.tracking(&code).await?;
    Ok((StatusCode::OK, Json(timeline)))
}
