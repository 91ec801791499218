use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::{
    db::{
        address_book_store::AddressBookStore, notification_store::NotificationStore,
        shipment_store::ShipmentStore,
    },
    error::{AppError, Result},
    models::{
        collection::{CollectionReceipt, ConfirmCollection},
        label::ShippingLabel,
        notification::NewNotification,
        rate::{QuoteLine, QuoteRequest},
        shipment::{
            Address, AddressPatch, AffectedRows, CollectionStatus, CreatedShipment, NewShipment,
            ParcelDetails, ParcelInput, Shipment, ShipmentDraft, ShipmentFilter, ShipmentStatus,
            ShipmentUpdate,
        },
        tracking::{TrackedShipment, TrackingTimelineResponse},
    },
    services::{
        notification_feed::NotificationFeed,
        pricing::{self, PriceInput},
        sources::{RateSource, SenderSource},
        tracking::TrackingTimeline,
    },
};

/// Shipment lifecycle: creation, edits, cancellation and collection
#[derive(Clone)]
pub struct ShipmentService {
    store: ShipmentStore,
    rates: Arc<dyn RateSource>,
    sender: Arc<dyn SenderSource>,
    feed: NotificationFeed,
}

impl ShipmentService {
    pub fn new(
        store: ShipmentStore,
        rates: Arc<dyn RateSource>,
        sender: Arc<dyn SenderSource>,
        feed: NotificationFeed,
    ) -> Self {
        Self {
            store,
            rates,
            sender,
            feed,
        }
    }

    pub async fn list(&self, filter: ShipmentFilter) -> Result<Vec<Shipment>> {
        self.store.list(filter).await
    }

    pub async fn get(&self, id: i64) -> Result<Shipment> {
        self.store.get(id).await
    }

    pub async fn recipient_history(&self, name: &str, limit: i64) -> Result<Vec<Shipment>> {
        self.store.history_for_recipient(name, limit).await
    }

    /// Create a shipment in `Processing`, priced with the current rate table
    pub async fn create(&self, payload: NewShipment) -> Result<CreatedShipment> {
        let recipient = payload
            .recipient
            .filter(|r| !r.name.trim().is_empty())
            .ok_or_else(|| AppError::validation("Recipient name is required"))?;

        let sender = match payload.sender {
            Some(sender) => sender,
            None => self.sender.sender_profile().await?,
        };

        let input = payload.details.unwrap_or_default();
        let carrier = input.carrier.as_deref().unwrap_or_default().trim().to_string();
        let details = parcel_details(&input);

        let rate = self.rates.rate(&carrier).await?;
        let cost = pricing::quote(
            rate.as_ref(),
            &PriceInput::new(details.weight, details.cod_amount, details.insured),
        );

        let draft = ShipmentDraft {
            date: today(),
            carrier,
            sender,
            recipient: trimmed_address(recipient),
            details,
            cost,
        };

        let mut tx = self.store.pool().begin().await?;
        let id = ShipmentStore::insert(&mut *tx, &draft).await?;
        AddressBookStore::record_shipment(&mut *tx, &draft.recipient.name, draft.date).await?;
        let notification =
            NotificationStore::insert(&mut *tx, &NewNotification::shipment_created(id)).await?;
        tx.commit().await?;

        tracing::info!(
            "Shipment {} created for {} via {:?} at {:.2}",
            id,
            draft.recipient.name,
            draft.carrier,
            cost
        );
        self.feed.announce(notification);

        Ok(CreatedShipment { id, cost })
    }

    /// Apply a partial update. Status edits are never refused; unusual
    /// transitions are only logged.
    pub async fn update(&self, id: i64, update: ShipmentUpdate) -> Result<Shipment> {
        let mut tx = self.store.pool().begin().await?;
        let mut shipment = ShipmentStore::find(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Shipment {id}")))?;

        if let Some(raw) = non_blank(update.status.as_deref()) {
            let next = ShipmentStatus::from(raw);
            if !next.is_known() {
                tracing::warn!("Shipment {} set to unrecognized status {:?}", id, raw);
            } else if !shipment.status.can_transition_to(&next) {
                tracing::warn!(
                    "Shipment {} moved from {} to {} outside the usual flow",
                    id,
                    shipment.status,
                    next
                );
            }
            shipment.status = next;
        }
        if let Some(carrier) = non_blank(update.carrier.as_deref()) {
            shipment.carrier = carrier.to_string();
        }
        if let Some(tracking) = non_blank(update.tracking.as_deref()) {
            shipment.tracking = Some(tracking.to_string());
        }
        if let Some(patch) = &update.recipient {
            apply_address_patch(&mut shipment.recipient, patch);
        }
        if let Some(details) = &update.details {
            apply_parcel_patch(&mut shipment, details);
        }

        ShipmentStore::save(&mut *tx, &shipment).await?;
        tx.commit().await?;

        self.store.get(id).await
    }

    pub async fn soft_delete(&self, id: i64) -> Result<()> {
        self.store.soft_delete(id).await?;
        tracing::info!("Shipment {} moved to the bin", id);
        Ok(())
    }

    /// Restore a cancelled shipment; any other status is left alone
    pub async fn restore(&self, id: i64) -> Result<Shipment> {
        if self.store.restore(id).await? {
            tracing::info!("Shipment {} restored", id);
        }
        self.store.get(id).await
    }

    pub async fn bulk_soft_delete(&self, ids: Option<Vec<i64>>) -> Result<AffectedRows> {
        let ids = ids
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| AppError::validation("A non-empty list of ids is required"))?;

        let count = self.store.bulk_soft_delete(&ids).await?;
        tracing::info!("{} shipments moved to the bin", count);

        Ok(AffectedRows { count })
    }

    pub async fn purge_cancelled(&self) -> Result<AffectedRows> {
        let count = self.store.purge_cancelled().await?;
        tracing::info!("Purged {} cancelled shipments", count);
        Ok(AffectedRows { count })
    }

    /// Mark the cash-on-delivery amount of a shipment as remitted
    pub async fn confirm_collection(
        &self,
        id: i64,
        request: ConfirmCollection,
    ) -> Result<CollectionReceipt> {
        let shipment = self.store.get(id).await?;
        let amount = shipment.details.cod_amount;
        if amount <= 0.0 {
            return Err(AppError::validation(format!(
                "Shipment {id} has no cash-on-delivery amount"
            )));
        }

        let date = request.date.unwrap_or_else(today);
        let note = request.note.unwrap_or_default();

        let mut tx = self.store.pool().begin().await?;
        ShipmentStore::confirm_collection(&mut *tx, id, date, note.trim()).await?;
        let notification = NotificationStore::insert(
            &mut *tx,
            &NewNotification::collection_confirmed(id, amount),
        )
        .await?;
        tx.commit().await?;

        tracing::info!("Collection of {:.2} confirmed for shipment {}", amount, id);
        self.feed.announce(notification);

        Ok(CollectionReceipt {
            id,
            amount,
            collection_date: date,
            message: format!("Collection of €{amount:.2} confirmed"),
        })
    }

    /// Resolve a tracking code, `#<id>` or bare id and build its timeline
    pub async fn tracking(&self, code: &str) -> Result<TrackingTimelineResponse> {
        let code = code.trim();
        let mut shipment = self.store.find_by_tracking(code).await?;

        if shipment.is_none() {
            if let Some(id) = code.strip_prefix('#').and_then(|rest| rest.parse::<i64>().ok()) {
                shipment = self.find(id).await?;
            }
        }
        if shipment.is_none() {
            if let Ok(id) = code.parse::<i64>() {
                shipment = self.find(id).await?;
            }
        }

        let shipment = shipment.ok_or_else(|| AppError::not_found(format!("Tracking {code}")))?;

        let timeline = TrackingTimeline::new(
            shipment.status.clone(),
            shipment.date,
            &shipment.sender.city,
            &shipment.recipient.city,
        );
        let events = timeline.events().collect();

        Ok(TrackingTimelineResponse {
            shipment: TrackedShipment {
                id: shipment.id,
                tracking: shipment.tracking,
                status: shipment.status,
                carrier: shipment.carrier,
                recipient_name: shipment.recipient.name,
                recipient_city: shipment.recipient.city,
            },
            events,
        })
    }

    async fn find(&self, id: i64) -> Result<Option<Shipment>> {
        let mut conn = self.store.pool().acquire().await?;
        ShipmentStore::find(&mut conn, id).await
    }

    /// Compare every active carrier for the given parcel
    pub async fn quote(&self, request: QuoteRequest) -> Result<Vec<QuoteLine>> {
        let weight = request
            .weight
            .filter(|w| *w > 0.0)
            .ok_or_else(|| AppError::validation("Weight must be greater than zero"))?;

        let input = PriceInput {
            weight,
            cod_amount: request.cod_amount.unwrap_or(0.0),
            insured: request.insured.unwrap_or(false),
            express: request.express.unwrap_or(false),
            packages: request.packages.unwrap_or(1),
        };

        let rates = self.rates.active_rates().await?;
        Ok(pricing::compare(&rates, &input))
    }

    pub async fn label(&self, id: i64) -> Result<ShippingLabel> {
        let shipment = self.store.get(id).await?;
        Ok(ShippingLabel::from(&shipment))
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn trimmed_address(address: Address) -> Address {
    Address {
        name: address.name.trim().to_string(),
        address: address.address.trim().to_string(),
        postal_code: address.postal_code.trim().to_string(),
        city: address.city.trim().to_string(),
        province: address.province.trim().to_string(),
        phone: address.phone.trim().to_string(),
        email: address.email.trim().to_string(),
    }
}

/// Defaults for a new parcel: one package of 1 kg, no volume, no cod
fn parcel_details(input: &ParcelInput) -> ParcelDetails {
    ParcelDetails {
        packages: input.packages.filter(|p| *p >= 1).unwrap_or(1),
        weight: input.weight.filter(|w| *w > 0.0).unwrap_or(1.0),
        volume: input.volume.filter(|v| *v > 0.0).unwrap_or(0.0),
        cod_amount: input.cod_amount.filter(|c| *c > 0.0).unwrap_or(0.0),
        insured: input.insured.unwrap_or(false),
        note: input.note.as_deref().unwrap_or_default().trim().to_string(),
    }
}

fn apply_address_patch(address: &mut Address, patch: &AddressPatch) {
    let fields = [
        (&mut address.name, &patch.name),
        (&mut address.address, &patch.address),
        (&mut address.postal_code, &patch.postal_code),
        (&mut address.city, &patch.city),
        (&mut address.province, &patch.province),
        (&mut address.phone, &patch.phone),
        (&mut address.email, &patch.email),
    ];
    for (field, value) in fields {
        if let Some(value) = non_blank(value.as_deref()) {
            *field = value.to_string();
        }
    }
}

/// Edits keep the cost charged at creation; the collection status follows the cod amount.
fn apply_parcel_patch(shipment: &mut Shipment, input: &ParcelInput) {
    let details = &mut shipment.details;

    if let Some(carrier) = non_blank(input.carrier.as_deref()) {
        shipment.carrier = carrier.to_string();
    }
    if let Some(packages) = input.packages.filter(|p| *p >= 1) {
        details.packages = packages;
    }
    if let Some(weight) = input.weight.filter(|w| *w > 0.0) {
        details.weight = weight;
    }
    if let Some(volume) = input.volume.filter(|v| *v >= 0.0) {
        details.volume = volume;
    }
    if let Some(insured) = input.insured {
        details.insured = insured;
    }
    if let Some(note) = non_blank(input.note.as_deref()) {
        details.note = note.to_string();
    }
    if let Some(cod_amount) = input.cod_amount.filter(|c| *c >= 0.0) {
        details.cod_amount = cod_amount;
        match shipment.collection_status {
            None if cod_amount > 0.0 => {
                shipment.collection_status = Some(CollectionStatus::Awaiting)
            }
            Some(CollectionStatus::Awaiting) if cod_amount == 0.0 => {
                shipment.collection_status = None
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parcel_defaults_replace_missing_or_invalid_values() {
        let details = parcel_details(&ParcelInput {
            weight: Some(-2.0),
            packages: Some(0),
            cod_amount: Some(-5.0),
            note: Some("  fragile ".into()),
            ..Default::default()
        });

        assert_eq!(details.weight, 1.0);
        assert_eq!(details.packages, 1);
        assert_eq!(details.cod_amount, 0.0);
        assert_eq!(details.note, "fragile");
        assert!(!details.insured);
    }

    #[test]
    fn address_patch_ignores_blank_values() {
        let mut address = Address {
            name: "Mario Rossi".into(),
            city: "Roma".into(),
            ..Default::default()
        };
        apply_address_patch(
            &mut address,
            &AddressPatch {
                name: Some("  ".into()),
                city: Some("Napoli".into()),
                ..Default::default()
            },
        );

        assert_eq!(address.name, "Mario Rossi");
        assert_eq!(address.city, "Napoli");
    }
}
