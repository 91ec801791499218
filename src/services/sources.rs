use async_trait::async_trait;

use crate::{
    error::Result,
    models::{rate::RateEntry, shipment::Address},
};

/// Where pricing parameters come from.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Rate for one carrier, matched exactly on its name.
    async fn rate(&self, carrier: &str) -> Result<Option<RateEntry>>;

    async fn active_rates(&self) -> Result<Vec<RateEntry>>;
}

/// Where the default sender of new shipments comes from.
#[async_trait]
pub trait SenderSource: Send + Sync {
    async fn sender_profile(&self) -> Result<Address>;
}
