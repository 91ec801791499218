use sqlx::{QueryBuilder, Sqlite};

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::collection::{
        CollectionEntry, CollectionLedger, CollectionRow, LedgerFilter, LedgerStats, SliceTotal,
    },
};

const LEDGER_BASE: &str = "FROM shipments WHERE cod_amount > 0 AND status != 'Cancelled'";

/// Read-side view over shipments that carry a cash-on-delivery amount
#[derive(Clone)]
pub struct CollectionStore {
    pool: DbPool,
}

impl CollectionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn ledger(&self, filter: LedgerFilter) -> Result<CollectionLedger> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, date, carrier, status, recipient_name, recipient_city, cod_amount, \
             collection_status, collection_date, tracking ",
        );
        builder.push(LEDGER_BASE);
        builder.push(match filter {
            LedgerFilter::All => "",
            LedgerFilter::Awaiting => " AND collection_status = 'Awaiting'",
            LedgerFilter::InTransit => {
                " AND collection_status = 'Awaiting' AND status IN ('In Transit', 'Out for Delivery')"
            }
            LedgerFilter::Collected => " AND collection_status = 'Collected'",
            LedgerFilter::Expired => " AND collection_status = 'Awaiting' AND status = 'On Hold'",
        });
        builder.push(" ORDER BY created_at DESC, id DESC");

        let rows = builder
            .build_query_as::<CollectionRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let stats = LedgerStats {
            awaiting: self.slice("collection_status = 'Awaiting'").await?,
            in_transit: self
                .slice("collection_status = 'Awaiting' AND status IN ('In Transit', 'Out for Delivery')")
                .await?,
            collected: self.slice("collection_status = 'Collected'").await?,
            expired: self
                .slice("collection_status = 'Awaiting' AND status = 'On Hold'")
                .await?,
        };

        Ok(CollectionLedger {
            entries: rows.into_iter().map(CollectionEntry::from).collect(),
            stats,
        })
    }

    async fn slice(&self, condition: &str) -> Result<SliceTotal> {
        let total = sqlx::query_as::<_, SliceTotal>(&format!(
            "SELECT COUNT(*) AS count, TOTAL(cod_amount) AS total {LEDGER_BASE} AND {condition}"
        ))
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(total)
    }
}
