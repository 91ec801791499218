use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

use crate::{
    handlers::{address_book, collection, manifest, notification, report, settings, shipment, user, ws},
    state::AppState,
};

/// Build the application router
///
/// Every JSON endpoint lives under `/api`; `/ws/notifications` streams the
/// notification feed and `/health` reports liveness.
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/shipments",
            get(shipment::list_shipments).post(shipment::create_shipment),
        )
        .route("/shipments/bulk-delete", post(shipment::bulk_delete))
        .route("/shipments/purge", post(shipment::purge_cancelled))
        .route(
            "/shipments/{id}",
            get(shipment::get_shipment)
                .put(shipment::update_shipment)
                .delete(shipment::delete_shipment),
        )
        .route("/shipments/{id}/restore", post(shipment::restore_shipment))
        .route("/shipments/{id}/label", get(shipment::get_label))
        .route("/quote", post(shipment::quote))
        .route("/tracking/{code}", get(shipment::tracking))
        .route(
            "/manifests",
            get(manifest::list_manifests).post(manifest::create_manifest),
        )
        .route(
            "/manifests/available/{carrier}",
            get(manifest::available_shipments),
        )
        .route(
            "/manifests/{id}",
            get(manifest::get_manifest).put(manifest::update_manifest_status),
        )
        .route("/collections", get(collection::ledger))
        .route(
            "/collections/{id}/confirm",
            post(collection::confirm_collection),
        )
        .route("/dashboard", get(report::dashboard))
        .route("/reports", get(report::report))
        .route(
            "/address-book",
            get(address_book::list_entries).post(address_book::create_entry),
        )
        .route(
            "/address-book/{id}",
            get(address_book::get_entry)
                .put(address_book::update_entry)
                .delete(address_book::delete_entry),
        )
        .route("/notifications", get(notification::list_notifications))
        .route("/notifications/read-all", post(notification::mark_all_read))
        .route(
            "/notifications/{id}",
            delete(notification::delete_notification),
        )
        .route("/settings", get(settings::get_settings))
        .route("/settings/sender", put(settings::update_sender))
        .route("/settings/rates/{carrier}", put(settings::update_rate))
        .route("/settings/backup", get(settings::backup))
        .route("/settings/restore", post(settings::restore))
        .route("/shopify/status", get(settings::shopify_status))
        .route("/shopify/configure", post(settings::configure_shopify))
        .route(
            "/shopify/test-connection",
            post(settings::test_shopify_connection),
        )
        .route("/users", get(user::get_all_users).post(user::create_user))
        .route(
            "/users/{id}",
            put(user::update_user).delete(user::delete_user),
        );

    Router::new()
        .nest("/api", api_routes)
        .route("/ws/notifications", get(ws::ws_handler))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "subscribers": state.feed.subscriber_count(),
    }))
}
