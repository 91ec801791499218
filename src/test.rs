use crate::config::Config;
use crate::db::{self, DbPool};
use crate::error::{AppError, Result};
use crate::models::shipment::{Address, CreatedShipment, NewShipment, ParcelInput};
use crate::state::AppState;

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// Helper function to setup a fresh database file and the full service graph
async fn setup_test_app() -> (PathBuf, DbPool, AppState) {
    let db_path = std::env::temp_dir().join(format!("shipping_desk_test_{}.db", Uuid::new_v4()));
    let config = Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: format!("sqlite://{}", db_path.display()),
        max_pool_size: 5,
        notification_channel_capacity: 16,
    };

    let pool = db::init_db_pool(&config.database_url, config.max_pool_size)
        .await
        .expect("Failed to initialize database");
    let state = AppState::new(pool.clone(), &config);

    (db_path, pool, state)
}

// Helper function to close the pool and remove the database files
async fn teardown_test_db(db_path: &Path, pool: DbPool) {
    pool.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let file = PathBuf::from(format!("{}{}", db_path.display(), suffix));
        if file.exists() {
            fs::remove_file(&file).expect("Failed to remove test database");
        }
    }
}

fn recipient(name: &str, city: &str) -> Address {
    Address {
        name: name.to_string(),
        address: "Via Roma 10".to_string(),
        postal_code: "00100".to_string(),
        city: city.to_string(),
        province: "RM".to_string(),
        ..Default::default()
    }
}

fn parcel(carrier: &str, weight: f64, cod_amount: f64) -> ParcelInput {
    ParcelInput {
        carrier: Some(carrier.to_string()),
        weight: Some(weight),
        cod_amount: Some(cod_amount),
        ..Default::default()
    }
}

// Helper function to create a shipment for `Mario Rossi` in Roma
async fn create_test_shipment(
    state: &AppState,
    carrier: &str,
    weight: f64,
    cod_amount: f64,
) -> CreatedShipment {
    state
        .shipments
        .create(NewShipment {
            sender: None,
            recipient: Some(recipient("Mario Rossi", "Roma")),
            details: Some(parcel(carrier, weight, cod_amount)),
        })
        .await
        .expect("Failed to create shipment")
}

#[cfg(test)]
mod shipment_tests {
    use super::*;
    use crate::models::manifest::NewManifest;
    use crate::models::shipment::{CollectionStatus, ShipmentFilter, ShipmentStatus, ShipmentUpdate};

    #[tokio::test]
    async fn test_create_prices_with_rate_table() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let brt = create_test_shipment(&state, "BRT", 2.0, 0.0).await;
        assert_eq!(brt.cost, 7.10);

        let dhl = state
            .shipments
            .create(NewShipment {
                sender: None,
                recipient: Some(recipient("Lucia Bianchi", "Torino")),
                details: Some(ParcelInput {
                    insured: Some(true),
                    ..parcel("DHL", 1.0, 50.0)
                }),
            })
            .await?;
        assert_eq!(dhl.cost, 13.46);

        let unknown = create_test_shipment(&state, "Pony Express", 3.0, 0.0).await;
        assert_eq!(unknown.cost, 7.00);

        let shipment = state.shipments.get(dhl.id).await?;
        assert_eq!(shipment.status, ShipmentStatus::Processing);
        assert_eq!(shipment.collection_status, Some(CollectionStatus::Awaiting));
        assert_eq!(shipment.sender.city, "Milano");
        assert!(shipment.tracking.is_none());

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_requires_recipient_name() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let err = state
            .shipments
            .create(NewShipment {
                sender: None,
                recipient: Some(recipient("   ", "Roma")),
                details: Some(parcel("BRT", 1.0, 0.0)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(state.shipments.list(ShipmentFilter::All).await?.is_empty());

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let created = create_test_shipment(&state, "GLS", 1.0, 0.0).await;
        state.shipments.soft_delete(created.id).await?;

        assert!(state.shipments.list(ShipmentFilter::Active).await?.is_empty());
        assert_eq!(state.shipments.list(ShipmentFilter::Cancelled).await?.len(), 1);

        let restored = state.shipments.restore(created.id).await?;
        assert_eq!(restored.status, ShipmentStatus::Processing);
        assert_eq!(state.shipments.list(ShipmentFilter::Active).await?.len(), 1);

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_keeps_every_other_field() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let created = create_test_shipment(&state, "GLS", 2.5, 30.0).await;
        state
            .manifests
            .create(NewManifest {
                carrier: Some("GLS".to_string()),
                shipment_ids: Some(vec![created.id]),
                ..Default::default()
            })
            .await?;

        let before = state.shipments.get(created.id).await?;
        assert!(before.tracking.is_some());
        assert!(before.manifest_id.is_some());
        assert_eq!(before.collection_status, Some(CollectionStatus::Awaiting));

        state.shipments.soft_delete(created.id).await?;
        let mut restored = state.shipments.restore(created.id).await?;
        assert_eq!(restored.status, ShipmentStatus::Processing);

        restored.status = before.status.clone();
        restored.updated_at = before.updated_at;
        assert_eq!(restored, before);

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_leaves_other_statuses_alone() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let created = create_test_shipment(&state, "SDA", 1.0, 0.0).await;
        state
            .shipments
            .update(
                created.id,
                ShipmentUpdate {
                    status: Some("Delivered".to_string()),
                    ..Default::default()
                },
            )
            .await?;

        let shipment = state.shipments.restore(created.id).await?;
        assert_eq!(shipment.status, ShipmentStatus::Delivered);

        let err = state.shipments.restore(9999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_purge_removes_cancelled_rows() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let kept = create_test_shipment(&state, "BRT", 1.0, 0.0).await;
        let binned = create_test_shipment(&state, "BRT", 1.0, 0.0).await;
        state.shipments.soft_delete(binned.id).await?;

        let purged = state.shipments.purge_cancelled().await?;
        assert_eq!(purged.count, 1);

        let err = state.shipments.get(binned.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(state.shipments.get(kept.id).await.is_ok());

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_delete_requires_ids() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let first = create_test_shipment(&state, "BRT", 1.0, 0.0).await;
        let second = create_test_shipment(&state, "BRT", 1.0, 0.0).await;

        let err = state.shipments.bulk_soft_delete(Some(vec![])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = state.shipments.bulk_soft_delete(None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let affected = state
            .shipments
            .bulk_soft_delete(Some(vec![first.id, second.id, 9999]))
            .await?;
        assert_eq!(affected.count, 2);

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_update_keeps_cost_and_syncs_collection() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let created = create_test_shipment(&state, "BRT", 2.0, 0.0).await;
        let updated = state
            .shipments
            .update(
                created.id,
                ShipmentUpdate {
                    details: Some(ParcelInput {
                        weight: Some(10.0),
                        cod_amount: Some(40.0),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await?;

        assert_eq!(updated.cost, 7.10);
        assert_eq!(updated.details.weight, 10.0);
        assert_eq!(updated.collection_status, Some(CollectionStatus::Awaiting));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_tracking_is_conflict() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let first = create_test_shipment(&state, "BRT", 1.0, 0.0).await;
        let second = create_test_shipment(&state, "BRT", 1.0, 0.0).await;

        let with_code = |code: &str| ShipmentUpdate {
            tracking: Some(code.to_string()),
            ..Default::default()
        };
        state.shipments.update(first.id, with_code("BRT123")).await?;
        let err = state
            .shipments
            .update(second.id, with_code("brt123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }
}

#[cfg(test)]
mod manifest_tests {
    use super::*;
    use crate::models::manifest::{ManifestStatus, ManifestStatusUpdate, NewManifest};
    use crate::models::shipment::ShipmentStatus;
    use std::collections::HashSet;

    fn batch(carrier: &str, ids: Vec<i64>) -> NewManifest {
        NewManifest {
            carrier: Some(carrier.to_string()),
            shipment_ids: Some(ids),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_batch_ships_and_assigns_tracking() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let first = create_test_shipment(&state, "GLS", 2.0, 0.0).await;
        let second = create_test_shipment(&state, "GLS", 3.5, 0.0).await;

        let summary = state
            .manifests
            .create(batch("GLS", vec![first.id, second.id]))
            .await?;

        assert!(summary.id.starts_with("DST-"));
        assert_eq!(summary.shipment_count, 2);
        assert_eq!(summary.package_count, 2);
        assert_eq!(summary.total_weight, 5.5);
        assert!(summary.excluded_ids.is_empty());

        let codes: HashSet<&str> = summary.shipments.iter().map(|s| s.tracking.as_str()).collect();
        assert_eq!(codes.len(), 2);
        assert!(codes.iter().all(|code| code.starts_with("GLS")));

        for id in [first.id, second.id] {
            let shipment = state.shipments.get(id).await?;
            assert_eq!(shipment.status, ShipmentStatus::Shipped);
            assert_eq!(shipment.manifest_id.as_deref(), Some(summary.id.as_str()));
        }

        let detail = state.manifests.detail(&summary.id).await?;
        assert_eq!(detail.manifest.status, ManifestStatus::AwaitingPickup);
        assert_eq!(detail.shipments.len(), 2);

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_batch_reports_ineligible_ids() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let gls = create_test_shipment(&state, "GLS", 1.0, 0.0).await;
        let brt = create_test_shipment(&state, "BRT", 1.0, 0.0).await;

        let summary = state
            .manifests
            .create(batch("GLS", vec![gls.id, brt.id, gls.id, 9999]))
            .await?;

        assert_eq!(summary.shipment_count, 1);
        assert_eq!(summary.excluded_ids, vec![brt.id, 9999]);
        assert_eq!(
            state.shipments.get(brt.id).await?.status,
            ShipmentStatus::Processing
        );

        // Already batched shipments cannot join a second manifest
        let err = state.manifests.create(batch("GLS", vec![gls.id])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_no_manifest() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let brt = create_test_shipment(&state, "BRT", 1.0, 0.0).await;

        let err = state.manifests.create(batch("GLS", vec![brt.id])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = state.manifests.create(batch("", vec![brt.id])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = state.manifests.create(batch("BRT", vec![])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(state.manifests.list().await?.is_empty());

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_restored_shipment_can_be_batched_again() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let created = create_test_shipment(&state, "GLS", 1.0, 0.0).await;
        let first = state.manifests.create(batch("GLS", vec![created.id])).await?;

        state.shipments.soft_delete(created.id).await?;
        let restored = state.shipments.restore(created.id).await?;
        assert_eq!(restored.status, ShipmentStatus::Processing);

        let available = state.manifests.available("GLS").await?;
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, created.id);

        let second = state.manifests.create(batch("GLS", vec![created.id])).await?;
        assert_eq!(second.shipment_count, 1);
        assert!(second.excluded_ids.is_empty());
        assert_ne!(second.id, first.id);

        let shipment = state.shipments.get(created.id).await?;
        assert_eq!(shipment.status, ShipmentStatus::Shipped);
        assert_eq!(shipment.manifest_id.as_deref(), Some(second.id.as_str()));
        assert_eq!(shipment.tracking.as_deref(), Some(second.shipments[0].tracking.as_str()));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_manifest_codes_increase() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let first = create_test_shipment(&state, "SDA", 1.0, 0.0).await;
        let second = create_test_shipment(&state, "SDA", 1.0, 0.0).await;

        let a = state.manifests.create(batch("SDA", vec![first.id])).await?;
        let b = state.manifests.create(batch("SDA", vec![second.id])).await?;
        assert!(b.id > a.id);

        let listed = state.manifests.list().await?;
        assert_eq!(listed.first().map(|m| m.id.as_str()), Some(b.id.as_str()));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_pickup_puts_shipments_in_transit() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let first = create_test_shipment(&state, "UPS", 1.0, 0.0).await;
        let second = create_test_shipment(&state, "UPS", 1.0, 0.0).await;
        let summary = state
            .manifests
            .create(batch("UPS", vec![first.id, second.id]))
            .await?;

        let change = state
            .manifests
            .update_status(
                &summary.id,
                ManifestStatusUpdate {
                    status: Some("Picked Up".to_string()),
                },
            )
            .await?;
        assert_eq!(change.status, ManifestStatus::PickedUp);
        assert_eq!(change.shipments_updated, 2);
        assert_eq!(
            state.shipments.get(first.id).await?.status,
            ShipmentStatus::InTransit
        );

        let err = state
            .manifests
            .update_status(
                "DST-99999",
                ManifestStatusUpdate {
                    status: Some("Picked Up".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }
}

#[cfg(test)]
mod collection_tests {
    use super::*;
    use crate::models::collection::{ConfirmCollection, LedgerFilter};
    use crate::models::shipment::{CollectionStatus, ShipmentUpdate};

    #[tokio::test]
    async fn test_ledger_slices() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let awaiting = create_test_shipment(&state, "BRT", 1.0, 30.0).await;
        let in_transit = create_test_shipment(&state, "BRT", 1.0, 20.0).await;
        let on_hold = create_test_shipment(&state, "BRT", 1.0, 15.0).await;
        let collected = create_test_shipment(&state, "BRT", 1.0, 50.0).await;
        let cancelled = create_test_shipment(&state, "BRT", 1.0, 99.0).await;
        create_test_shipment(&state, "BRT", 1.0, 0.0).await;

        let set_status = |status: &str| ShipmentUpdate {
            status: Some(status.to_string()),
            ..Default::default()
        };
        state.shipments.update(in_transit.id, set_status("In Transit")).await?;
        state.shipments.update(on_hold.id, set_status("On Hold")).await?;
        state
            .shipments
            .confirm_collection(collected.id, ConfirmCollection::default())
            .await?;
        state.shipments.soft_delete(cancelled.id).await?;

        let ledger = state.collections.ledger(LedgerFilter::All).await?;
        assert_eq!(ledger.entries.len(), 4);
        assert_eq!(ledger.stats.awaiting.count, 3);
        assert_eq!(ledger.stats.awaiting.total, 65.0);
        assert_eq!(ledger.stats.in_transit.count, 1);
        assert_eq!(ledger.stats.in_transit.total, 20.0);
        assert_eq!(ledger.stats.expired.count, 1);
        assert_eq!(ledger.stats.expired.total, 15.0);
        assert_eq!(ledger.stats.collected.count, 1);
        assert_eq!(ledger.stats.collected.total, 50.0);

        let only_awaiting = state.collections.ledger(LedgerFilter::Awaiting).await?;
        assert!(only_awaiting.entries.iter().any(|e| e.id == awaiting.id));
        assert!(only_awaiting.entries.iter().all(|e| e.id != collected.id));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_collection() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let with_cod = create_test_shipment(&state, "GLS", 1.0, 42.5).await;
        let without_cod = create_test_shipment(&state, "GLS", 1.0, 0.0).await;

        let receipt = state
            .shipments
            .confirm_collection(
                with_cod.id,
                ConfirmCollection {
                    date: None,
                    note: Some("cash at desk".to_string()),
                },
            )
            .await?;
        assert_eq!(receipt.amount, 42.5);
        assert_eq!(receipt.message, "Collection of €42.50 confirmed");

        let shipment = state.shipments.get(with_cod.id).await?;
        assert_eq!(shipment.collection_status, Some(CollectionStatus::Collected));
        assert_eq!(shipment.collection_note.as_deref(), Some("cash at desk"));

        let err = state
            .shipments
            .confirm_collection(without_cod.id, ConfirmCollection::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let feed = state.feed.latest().await?;
        assert!(feed.iter().any(|n| n.kind == "collection"));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_collection_rolls_back_without_notification() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let created = create_test_shipment(&state, "BRT", 1.0, 18.0).await;

        // Make the notification insert fail inside the collection transaction
        sqlx::query("DROP TABLE notifications").execute(&pool).await?;

        let result = state
            .shipments
            .confirm_collection(created.id, ConfirmCollection::default())
            .await;
        assert!(matches!(result, Err(AppError::Database(_))));

        let shipment = state.shipments.get(created.id).await?;
        assert_eq!(shipment.collection_status, Some(CollectionStatus::Awaiting));
        assert!(shipment.collection_date.is_none());

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }
}

#[cfg(test)]
mod tracking_tests {
    use super::*;
    use crate::models::shipment::ShipmentUpdate;

    #[tokio::test]
    async fn test_lookup_precedence() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let first = create_test_shipment(&state, "BRT", 1.0, 0.0).await;
        let second = create_test_shipment(&state, "BRT", 1.0, 0.0).await;

        // A tracking code that looks like the id of another shipment wins
        state
            .shipments
            .update(
                second.id,
                ShipmentUpdate {
                    tracking: Some(first.id.to_string()),
                    status: Some("Shipped".to_string()),
                    ..Default::default()
                },
            )
            .await?;

        let by_code = state.shipments.tracking(&first.id.to_string()).await?;
        assert_eq!(by_code.shipment.id, second.id);

        let by_hash = state.shipments.tracking(&format!("#{}", first.id)).await?;
        assert_eq!(by_hash.shipment.id, first.id);
        assert_eq!(by_hash.events.len(), 1);
        assert_eq!(by_hash.events[0].location, "Milano");

        let shipped = state.shipments.tracking(&format!("#{}", second.id)).await?;
        assert_eq!(shipped.events.len(), 2);
        assert_eq!(shipped.events[0].status, "Shipped");

        let err = state.shipments.tracking("NOPE").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }
}

#[cfg(test)]
mod address_book_tests {
    use super::*;
    use crate::models::address_book::{AddressBookSort, NewAddressBookEntry};

    #[tokio::test]
    async fn test_shipments_bump_matching_entry() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let id = state
            .address_book
            .create(&NewAddressBookEntry {
                name: Some("Mario Rossi".to_string()),
                city: Some("Roma".to_string()),
                ..Default::default()
            })
            .await?;
        state
            .address_book
            .create(&NewAddressBookEntry {
                name: Some("Anna Verdi".to_string()),
                city: Some("Bari".to_string()),
                ..Default::default()
            })
            .await?;

        create_test_shipment(&state, "BRT", 1.0, 0.0).await;
        create_test_shipment(&state, "BRT", 1.0, 0.0).await;

        let entry = state.address_book.get(id).await?;
        assert_eq!(entry.shipment_count, 2);
        assert!(entry.last_shipment.is_some());

        let frequent = state.address_book.list(None, AddressBookSort::Frequent).await?;
        assert_eq!(frequent[0].id, id);

        let found = state.address_book.list(Some("bari"), AddressBookSort::Name).await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Anna Verdi");

        let err = state
            .address_book
            .create(&NewAddressBookEntry::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }
}

#[cfg(test)]
mod report_tests {
    use super::*;
    use crate::models::report::ReportPeriod;
    use crate::models::shipment::ShipmentUpdate;
    use chrono::Utc;

    #[tokio::test]
    async fn test_dashboard_and_report_counts() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        create_test_shipment(&state, "BRT", 2.0, 25.0).await;
        let delivered = create_test_shipment(&state, "GLS", 1.0, 0.0).await;
        let cancelled = create_test_shipment(&state, "GLS", 1.0, 10.0).await;
        state
            .shipments
            .update(
                delivered.id,
                ShipmentUpdate {
                    status: Some("Delivered".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        state.shipments.soft_delete(cancelled.id).await?;

        let today = Utc::now().date_naive();
        let kpis = state.reports.dashboard(today).await?;
        assert_eq!(kpis.shipments_today, 2);
        assert_eq!(kpis.delivered_this_month, 1);
        assert_eq!(kpis.cod_awaiting_total, 25.0);
        assert_eq!(kpis.shipments_this_week, 2);

        let report = state.reports.report(ReportPeriod::Month, today).await?;
        assert_eq!(report.total_shipments, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.success_rate, 50);
        assert_eq!(report.per_carrier.get("BRT"), Some(&1));
        assert_eq!(report.per_carrier.get("GLS"), Some(&1));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }
}

#[cfg(test)]
mod user_tests {
    use super::*;
    use crate::db::DEFAULT_ADMIN_EMAIL;
    use crate::models::user::{NewUser, Role, UserUpdate};
    use crate::services::password::verify_password;

    fn operator(email: &str) -> NewUser {
        NewUser {
            name: Some("Operator".to_string()),
            email: Some(email.to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_default_admin_is_seeded() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let users = state.users.get_all_users().await?;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, DEFAULT_ADMIN_EMAIL);
        assert_eq!(users[0].role, Role::Admin);

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_hashes_and_rejects_duplicates() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let user = state.users.create_user(&operator("op@example.com")).await?;
        assert_eq!(user.role, Role::Operator);
        assert_ne!(user.password_hash, "secret");
        assert!(verify_password("secret", &user.password_hash));

        let err = state
            .users
            .create_user(&operator("op@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_last_admin_is_protected() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let admin_id = state.users.get_all_users().await?[0].id;

        let err = state.users.delete_user(admin_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let demote = UserUpdate {
            role: Some(Role::Operator),
            ..Default::default()
        };
        let err = state.users.update_user(admin_id, &demote).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // With a second admin the first one may step down
        let mut second = operator("second@example.com");
        second.role = Some(Role::Admin);
        state.users.create_user(&second).await?;
        let demoted = state.users.update_user(admin_id, &demote).await?;
        assert_eq!(demoted.role, Role::Operator);

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }
}

#[cfg(test)]
mod notification_tests {
    use super::*;

    #[tokio::test]
    async fn test_feed_persists_and_broadcasts() -> Result<()> {
        let (db_path, pool, state) = setup_test_app().await;

        let mut receiver = state.feed.subscribe();
        let created = create_test_shipment(&state, "BRT", 1.0, 0.0).await;

        let received = receiver.recv().await.expect("notification broadcast");
        assert_eq!(received.kind, "shipment");
        assert!(received.message.contains(&format!("#{}", created.id)));

        let feed = state.feed.latest().await?;
        assert_eq!(feed.len(), 1);
        assert!(!feed[0].is_read);

        assert_eq!(state.feed.mark_all_read().await?, 1);
        assert!(state.feed.latest().await?.iter().all(|n| n.is_read));

        state.feed.delete(feed[0].id).await?;
        let err = state.feed.delete(feed[0].id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        teardown_test_db(&db_path, pool).await;
        Ok(())
    }
}
