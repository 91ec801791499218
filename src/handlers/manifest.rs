use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    models::manifest::{ManifestStatusUpdate, NewManifest},
    state::AppState,
};

pub async fn list_manifests(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let manifests = state.manifests.list().await?;
    Ok((StatusCode::OK, Json(manifests)))
}

pub async fn get_manifest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let detail = state.manifests.detail(&id).await?;
    Ok((StatusCode::OK, Json(detail)))
}

/// Batch shipments into a new manifest
pub async fn create_manifest(
    State(state): State<AppState>,
    Json(request): Json<NewManifest>,
) -> Result<impl IntoResponse> {
    let summary = state.manifests.create(request).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn update_manifest_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ManifestStatusUpdate>,
) -> Result<impl IntoResponse> {
    let change = state.manifests.update_status(&id, update).await?;
    Ok((StatusCode::OK, Json(change)))
}

/// Shipments that could still join a manifest for this carrier
pub async fn available_shipments(
    State(state): State<AppState>,
    Path(carrier): Path<String>,
) -> Result<impl IntoResponse> {
    let shipments = state.manifests.available(&carrier).await?;
    Ok((StatusCode::OK, Json(shipments)))
}
