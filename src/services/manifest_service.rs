use std::collections::HashSet;

use chrono::Utc;
use rand::Rng;
use sqlx::SqliteConnection;

use crate::{
    db::{
        manifest_store::ManifestStore, notification_store::NotificationStore,
        shipment_store::ShipmentStore,
    },
    error::{AppError, Result},
    models::{
        manifest::{
            BatchedShipment, Manifest, ManifestDetail, ManifestStatus, ManifestStatusChange,
            ManifestStatusUpdate, ManifestSummary, NewManifest,
        },
        notification::NewNotification,
        shipment::Shipment,
    },
    services::notification_feed::NotificationFeed,
};

/// Attempts at drawing an unused tracking code before giving up.
const TRACKING_ATTEMPTS: usize = 16;

/// Carrier handoff batches
#[derive(Clone)]
pub struct ManifestService {
    manifests: ManifestStore,
    shipments: ShipmentStore,
    feed: NotificationFeed,
}

impl ManifestService {
    pub fn new(manifests: ManifestStore, shipments: ShipmentStore, feed: NotificationFeed) -> Self {
        Self {
            manifests,
            shipments,
            feed,
        }
    }

    pub async fn list(&self) -> Result<Vec<Manifest>> {
        self.manifests.list().await
    }

    pub async fn detail(&self, id: &str) -> Result<ManifestDetail> {
        let manifest = self.manifests.get(id).await?;
        let shipments = self.shipments.by_manifest(&manifest.id).await?;
        Ok(ManifestDetail {
            manifest,
            shipments,
        })
    }

    pub async fn available(&self, carrier: &str) -> Result<Vec<Shipment>> {
        self.shipments.available_for_carrier(carrier.trim()).await
    }

    /// Batch eligible shipments under a new manifest.
    ///
    /// Runs as one transaction: the manifest row, the shipment transitions
    /// and the notification either all persist or none do. Requested ids
    /// that are not `Processing`, belong to another carrier or already sit
    /// in a manifest are reported back in `excluded_ids`.
    pub async fn create(&self, request: NewManifest) -> Result<ManifestSummary> {
        let carrier = request
            .carrier
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::validation("Carrier is required"))?
            .to_string();

        let mut seen = HashSet::new();
        let requested: Vec<i64> = request
            .shipment_ids
            .unwrap_or_default()
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();
        if requested.is_empty() {
            return Err(AppError::validation("At least one shipment is required"));
        }

        let today = Utc::now().date_naive();
        let pickup_date = request.pickup_date.unwrap_or(today);
        let note = request.note.as_deref().unwrap_or_default().trim();

        let mut tx = self.manifests.pool().begin().await?;

        let code = ManifestStore::reserve(&mut *tx, &carrier, today, pickup_date, note).await?;

        let eligible = ShipmentStore::eligible_for_batch(&mut *tx, &carrier, &requested).await?;
        if eligible.is_empty() {
            return Err(AppError::validation(format!(
                "None of the selected shipments can be batched for {carrier}"
            )));
        }

        let shipment_count = eligible.len() as i64;
        let package_count: i64 = eligible.iter().map(|s| s.packages).sum();
        let total_weight: f64 = eligible.iter().map(|s| s.weight).sum();
        ManifestStore::finalize(&mut *tx, &code, shipment_count, package_count, total_weight)
            .await?;

        let prefix = carrier_prefix(&carrier);
        let mut batched = Vec::with_capacity(eligible.len());
        for candidate in &eligible {
            let tracking = unused_tracking_code(&mut *tx, &prefix, candidate.id).await?;
            ShipmentStore::mark_shipped(&mut *tx, candidate.id, &code, &tracking).await?;
            batched.push(BatchedShipment {
                id: candidate.id,
                tracking,
            });
        }

        let included: HashSet<i64> = eligible.iter().map(|s| s.id).collect();
        let excluded_ids: Vec<i64> = requested
            .into_iter()
            .filter(|id| !included.contains(id))
            .collect();

        let notification = NotificationStore::insert(
            &mut *tx,
            &NewNotification::manifest_created(&code, shipment_count),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Manifest {} created for {} with {} shipments ({} excluded)",
            code,
            carrier,
            shipment_count,
            excluded_ids.len()
        );
        self.feed.announce(notification);

        Ok(ManifestSummary {
            id: code,
            carrier,
            shipment_count,
            package_count,
            total_weight,
            shipments: batched,
            excluded_ids,
        })
    }

    /// Change the manifest status; `Picked Up` puts its shipments in transit
    pub async fn update_status(
        &self,
        id: &str,
        update: ManifestStatusUpdate,
    ) -> Result<ManifestStatusChange> {
        let status = update
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| ManifestStatus::from(s.to_string()))
            .ok_or_else(|| AppError::validation("Status is required"))?;

        let mut tx = self.manifests.pool().begin().await?;
        ManifestStore::set_status(&mut *tx, id, &status).await?;

        let shipments_updated = if status == ManifestStatus::PickedUp {
            ShipmentStore::mark_in_transit_for_manifest(&mut *tx, id).await?
        } else {
            0
        };
        tx.commit().await?;

        tracing::info!(
            "Manifest {} set to {} ({} shipments updated)",
            id,
            status,
            shipments_updated
        );

        Ok(ManifestStatusChange {
            id: id.to_string(),
            status,
            shipments_updated,
        })
    }
}

/// First three ASCII letters of the carrier, uppercased and padded with `X`
fn carrier_prefix(carrier: &str) -> String {
    let letters: String = carrier
        .chars()
        .filter(char::is_ascii_alphabetic)
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    format!("{letters:X<3}")
}

fn tracking_code(prefix: &str, shipment_id: i64) -> String {
    let suffix: u32 = rand::rng().random_range(0..1_000_000);
    format!("{prefix}{suffix:06}{shipment_id}")
}

async fn unused_tracking_code(
    conn: &mut SqliteConnection,
    prefix: &str,
    shipment_id: i64,
) -> Result<String> {
    for _ in 0..TRACKING_ATTEMPTS {
        let code = tracking_code(prefix, shipment_id);
        if !ShipmentStore::tracking_exists(&mut *conn, &code).await? {
            return Ok(code);
        }
        tracing::debug!("Tracking code {} already taken, drawing again", code);
    }

    Err(AppError::Internal(format!(
        "could not allocate a tracking code for shipment {shipment_id}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_use_letters_only_and_pad() {
        assert_eq!(carrier_prefix("GLS"), "GLS");
        assert_eq!(carrier_prefix("Poste Italiane"), "POS");
        assert_eq!(carrier_prefix("dhl"), "DHL");
        assert_eq!(carrier_prefix("A1"), "AXX");
        assert_eq!(carrier_prefix("42"), "XXX");
    }

    #[test]
    fn tracking_codes_have_fixed_width_suffix() {
        let code = tracking_code("BRT", 17);
        assert_eq!(code.len(), 3 + 6 + 2);
        assert!(code.starts_with("BRT"));
        assert!(code.ends_with("17"));
        assert!(code[3..9].chars().all(|c| c.is_ascii_digit()));
    }
}
