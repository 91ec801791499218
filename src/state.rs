use std::sync::Arc;

use crate::{
    config::Config,
    db::{
        DbPool, address_book_store::AddressBookStore, collection_store::CollectionStore,
        manifest_store::ManifestStore, report_store::ReportStore, settings_store::SettingsStore,
        shipment_store::ShipmentStore, user_store::UserStore,
    },
    services::{ManifestService, NotificationFeed, ShipmentService},
};

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub shipments: ShipmentService,
    pub manifests: ManifestService,
    pub collections: CollectionStore,
    pub reports: ReportStore,
    pub address_book: AddressBookStore,
    pub settings: SettingsStore,
    pub users: UserStore,
    pub feed: NotificationFeed,
}

impl AppState {
    pub fn new(pool: DbPool, config: &Config) -> Self {
        let feed = NotificationFeed::new(pool.clone(), config.notification_channel_capacity);
        let settings = SettingsStore::new(pool.clone());
        let shipment_store = ShipmentStore::new(pool.clone());

        let shipments = ShipmentService::new(
            shipment_store.clone(),
            Arc::new(settings.clone()),
            Arc::new(settings.clone()),
            feed.clone(),
        );
        let manifests =
            ManifestService::new(ManifestStore::new(pool.clone()), shipment_store, feed.clone());

        Self {
            shipments,
            manifests,
            collections: CollectionStore::new(pool.clone()),
            reports: ReportStore::new(pool.clone()),
            address_book: AddressBookStore::new(pool.clone()),
            settings,
            users: UserStore::new(pool),
            feed,
        }
    }
}
