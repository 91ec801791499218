pub mod manifest_service;
pub mod notification_feed;
pub mod password;
pub mod pricing;
pub mod shipment_service;
pub mod sources;
pub mod tracking;

pub use manifest_service::ManifestService;
pub use notification_feed::NotificationFeed;
pub use shipment_service::ShipmentService;
