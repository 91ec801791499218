use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    error::{AppError, Result},
    models::{
        rate::RateUpdate,
        settings::{
            BACKUP_FORMAT_VERSION, BackupData, BackupDocument, RestoreRequest, SettingsOverview,
            ShopifyConfig, StubResponse,
        },
        shipment::{AddressPatch, ShipmentFilter},
    },
    services::sources::SenderSource,
    state::AppState,
};

/// Sender profile and rate table
pub async fn get_settings(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let overview = SettingsOverview {
        sender: state.settings.sender_profile().await?,
        rates: state.settings.rates().await?,
    };
    Ok((StatusCode::OK, Json(overview)))
}

pub async fn update_sender(
    State(state): State<AppState>,
    Json(patch): Json<AddressPatch>,
) -> Result<impl IntoResponse> {
    let sender = state.settings.update_sender(&patch).await?;
    tracing::info!("Sender profile updated");
    Ok((StatusCode::OK, Json(sender)))
}

pub async fn update_rate(
    State(state): State<AppState>,
    Path(carrier): Path<String>,
    Json(update): Json<RateUpdate>,
) -> Result<impl IntoResponse> {
    let carrier = carrier.trim();
    if carrier.is_empty() {
        return Err(AppError::validation("Carrier is required"));
    }
    let rate = state.settings.upsert_rate(carrier, &update).await?;
    Ok((StatusCode::OK, Json(rate)))
}

/// Full data export
pub async fn backup(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let document = BackupDocument {
        version: BACKUP_FORMAT_VERSION,
        exported_at: Utc::now(),
        data: BackupData {
            shipments: state.shipments.list(ShipmentFilter::All).await?,
            manifests: state.manifests.list().await?,
            address_book: state.address_book.all().await?,
            settings: state.settings.all().await?,
            rates: state.settings.rates().await?,
        },
    };
    Ok((StatusCode::OK, Json(document)))
}

/// Restore settings rows from a backup document
pub async fn restore(
    State(state): State<AppState>,
    Json(request): Json<RestoreRequest>,
) -> Result<impl IntoResponse> {
    let data = request
        .data
        .ok_or_else(|| AppError::validation("Backup data is missing"))?;

    let count = state.settings.restore(&data.settings).await?;
    tracing::info!("Restored {} settings from backup", count);

    Ok((StatusCode::OK, Json(json!({ "restoredSettings": count }))))
}

pub async fn shopify_status(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let status = state.settings.shopify_status().await?;
    Ok((StatusCode::OK, Json(status)))
}

pub async fn configure_shopify(
    State(state): State<AppState>,
    Json(config): Json<ShopifyConfig>,
) -> Result<impl IntoResponse> {
    let status = state.settings.configure_shopify(&config).await?;
    Ok((StatusCode::OK, Json(status)))
}

/// No store is contacted; the answer only reflects the saved settings
pub async fn test_shopify_connection(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let status = state.settings.shopify_status().await?;
    let response = if status.configured {
        StubResponse {
            success: true,
            message: "Connection simulated successfully",
        }
    } else {
        StubResponse {
            success: false,
            message: "Shopify is not configured",
        }
    };
    Ok((StatusCode::OK, Json(response)))
}
