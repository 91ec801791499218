use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    models::address_book::{AddressBookDetail, AddressBookParams, CreatedEntry, NewAddressBookEntry},
    state::AppState,
};

/// Shipments shown on an address book entry
const HISTORY_LIMIT: i64 = 20;

pub async fn list_entries(
    State(state): State<AppState>,
    Query(params): Query<AddressBookParams>,
) -> Result<impl IntoResponse> {
    let entries = state
        .address_book
        .list(params.search.as_deref(), params.sort)
        .await?;
    Ok((StatusCode::OK, Json(entries)))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let entry = state.address_book.get(id).await?;
    let shipments = state
        .shipments
        .recipient_history(&entry.name, HISTORY_LIMIT)
        .await?;
    Ok((StatusCode::OK, Json(AddressBookDetail { entry, shipments })))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Json(entry): Json<NewAddressBookEntry>,
) -> Result<impl IntoResponse> {
    let id = state.address_book.create(&entry).await?;
    Ok((StatusCode::CREATED, Json(CreatedEntry { id })))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<NewAddressBookEntry>,
) -> Result<impl IntoResponse> {
    let entry = state.address_book.update(id, &patch).await?;
    Ok((StatusCode::OK, Json(entry)))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.address_book.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
