use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{shipment::ShipmentStatus, tracking::TrackingEvent};

const HOUR: i64 = 60;
const DAY: i64 = 24 * HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Place {
    Origin,
    OriginHub,
    CentralHub,
    Destination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Always,
    /// Reached once the status is at or beyond this rank on the delivery chain.
    Rank(u8),
    OnHold,
}

struct Step {
    after_minutes: i64,
    description: &'static str,
    status: &'static str,
    place: Place,
    trigger: Trigger,
}

/// Milestones in chronological order.
const STEPS: [Step; 6] = [
    Step {
        after_minutes: 0,
        description: "Shipment created",
        status: "Created",
        place: Place::Origin,
        trigger: Trigger::Always,
    },
    Step {
        after_minutes: 4 * HOUR,
        description: "Parcel picked up by the carrier",
        status: "Shipped",
        place: Place::OriginHub,
        trigger: Trigger::Rank(1),
    },
    Step {
        after_minutes: DAY,
        description: "In transit to destination",
        status: "In Transit",
        place: Place::CentralHub,
        trigger: Trigger::Rank(2),
    },
    Step {
        after_minutes: 2 * DAY,
        description: "Out for delivery today",
        status: "Out for Delivery",
        place: Place::Destination,
        trigger: Trigger::Rank(3),
    },
    Step {
        after_minutes: 2 * DAY,
        description: "Delivery attempt failed",
        status: "On Hold",
        place: Place::Destination,
        trigger: Trigger::OnHold,
    },
    Step {
        after_minutes: 2 * DAY + 14 * HOUR + 30,
        description: "Delivered",
        status: "Delivered",
        place: Place::Destination,
        trigger: Trigger::Rank(4),
    },
];

/// Synthetic carrier scan history derived from a shipment's current status.
///
/// No carrier feed exists, so events are placed at fixed offsets from
/// midnight UTC of the shipment date.
#[derive(Debug, Clone)]
pub struct TrackingTimeline {
    status: ShipmentStatus,
    reference: DateTime<Utc>,
    origin: String,
    destination: String,
}

impl TrackingTimeline {
    pub fn new(status: ShipmentStatus, date: NaiveDate, origin: &str, destination: &str) -> Self {
        Self {
            status,
            reference: date.and_time(chrono::NaiveTime::MIN).and_utc(),
            origin: non_empty(origin, "Origin"),
            destination: non_empty(destination, "Destination"),
        }
    }

    /// Events newest first. Each call starts a fresh pass.
    pub fn events(&self) -> impl Iterator<Item = TrackingEvent> + '_ {
        let rank = self.status.milestone_rank();
        let on_hold = self.status == ShipmentStatus::OnHold;

        STEPS
            .iter()
            .rev()
            .filter(move |step| match step.trigger {
                Trigger::Always => true,
                Trigger::Rank(needed) => rank.is_some_and(|r| r >= needed),
                Trigger::OnHold => on_hold,
            })
            .map(move |step| TrackingEvent {
                timestamp: self.reference + Duration::minutes(step.after_minutes),
                description: step.description,
                location: self.location(step.place),
                status: step.status,
            })
    }

    fn location(&self, place: Place) -> String {
        match place {
            Place::Origin => self.origin.clone(),
            Place::OriginHub => format!("Hub {}", self.origin),
            Place::CentralHub => "Central hub".to_string(),
            Place::Destination => self.destination.clone(),
        }
    }
}

fn non_empty(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(status: ShipmentStatus) -> TrackingTimeline {
        TrackingTimeline::new(
            status,
            NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            "Milano",
            "Roma",
        )
    }

    fn statuses(timeline: &TrackingTimeline) -> Vec<&'static str> {
        timeline.events().map(|e| e.status).collect()
    }

    #[test]
    fn processing_has_only_creation() {
        let events: Vec<_> = timeline(ShipmentStatus::Processing).events().collect();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, "Created");
        assert_eq!(events[0].location, "Milano");
        assert_eq!(events[0].timestamp.to_rfc3339(), "2026-05-04T00:00:00+00:00");
    }

    #[test]
    fn delivered_lists_every_milestone_newest_first() {
        let t = timeline(ShipmentStatus::Delivered);
        assert_eq!(
            statuses(&t),
            ["Delivered", "Out for Delivery", "In Transit", "Shipped", "Created"]
        );

        let events: Vec<_> = t.events().collect();
        assert_eq!(events[0].timestamp.to_rfc3339(), "2026-05-06T14:30:00+00:00");
        assert_eq!(events[0].location, "Roma");
        assert_eq!(events[2].location, "Central hub");
        assert_eq!(events[3].location, "Hub Milano");
        assert!(events.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn in_transit_stops_at_its_milestone() {
        assert_eq!(
            statuses(&timeline(ShipmentStatus::InTransit)),
            ["In Transit", "Shipped", "Created"]
        );
    }

    #[test]
    fn on_hold_reports_failed_attempt() {
        let events: Vec<_> = timeline(ShipmentStatus::OnHold).events().collect();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].description, "Delivery attempt failed");
        assert_eq!(events[0].timestamp.to_rfc3339(), "2026-05-06T00:00:00+00:00");
        assert_eq!(events[1].status, "Created");
    }

    #[test]
    fn cancelled_and_unknown_only_show_creation() {
        assert_eq!(statuses(&timeline(ShipmentStatus::Cancelled)), ["Created"]);
        assert_eq!(
            statuses(&timeline(ShipmentStatus::Unrecognized("Lost".into()))),
            ["Created"]
        );
    }

    #[test]
    fn sequence_is_restartable_and_has_placeholders() {
        let t = TrackingTimeline::new(
            ShipmentStatus::Shipped,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            " ",
            "",
        );
        let first: Vec<_> = t.events().collect();
        let second: Vec<_> = t.events().collect();

        assert_eq!(first, second);
        assert_eq!(first[0].location, "Hub Origin");
    }
}
