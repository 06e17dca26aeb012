//! PostgreSQL index backend.
//!
//! Reads the tables maintained by the indexer:
//! `tx_id_address_mapping(transaction_id, address, block_time)`,
//! `addresses_transactions(address)` keyed by payload and
//! `addresses_names(address, name)`. Transaction detail lookups live in
//! [`super::search`].

use crate::config::DatabaseConfig;
use async_trait::async_trait;
use rest_gateway::domain::Address;
use rest_gateway::ports::{
    ActivityIndex, AddressNameStore, AddressTransactionReader, AddressTransactionStore,
    IndexBackend, TransactionSearch,
};
use rest_gateway::{EpochMillis, MappingRow, TransactionId, UpstreamError};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Postgres;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

const NEWEST_BEFORE: &str = "\
    SELECT transaction_id, block_time FROM tx_id_address_mapping \
    WHERE address = $1 AND block_time < $2 \
    ORDER BY block_time DESC, transaction_id ASC \
    LIMIT $3";

const AT_BLOCK_TIME: &str = "\
    SELECT transaction_id FROM tx_id_address_mapping \
    WHERE address = $1 AND block_time = $2 \
    ORDER BY transaction_id ASC";

const NEWEST_WITH_OFFSET: &str = "\
    SELECT transaction_id FROM tx_id_address_mapping \
    WHERE address = $1 \
    ORDER BY block_time DESC, transaction_id ASC \
    LIMIT $2 OFFSET $3";

const COUNT: &str = "SELECT COUNT(*) FROM tx_id_address_mapping WHERE address = $1";

/// Payloads without any row in the activity table.
const INACTIVE_PAYLOADS: &str = "\
    SELECT p.payload FROM UNNEST($1::text[]) AS p(payload) \
    LEFT JOIN addresses_transactions t ON t.address = p.payload \
    WHERE t.address IS NULL";

const NAME_OF: &str = "SELECT name FROM addresses_names WHERE address = $1 LIMIT 1";

/// Map a driver error to the port error. Details stay in the logs.
pub(crate) fn db_error(source: sqlx::Error) -> UpstreamError {
    UpstreamError::Unavailable(format!("database: {}", source))
}

/// Index backend over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgIndex {
    pub(crate) pool: PgPool,
}

impl PgIndex {
    /// Connect a pool to `url` with the configured limits.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(url)
            .await?;
        info!(
            max_connections = config.max_connections,
            "Connected to index database"
        );
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Reader holding one pooled connection until dropped.
struct PgReader {
    conn: PoolConnection<Postgres>,
}

fn sql_int(value: u32) -> i64 {
    i64::from(value)
}

#[async_trait]
impl AddressTransactionReader for PgReader {
    async fn newest_before(
        &mut self,
        address: &Address,
        before: EpochMillis,
        limit: u32,
    ) -> Result<Vec<MappingRow>, UpstreamError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(NEWEST_BEFORE)
            .bind(address.as_str())
            .bind(before)
            .bind(sql_int(limit))
            .fetch_all(&mut *self.conn)
            .await
            .map_err(db_error)?;
        Ok(rows
            .into_iter()
            .map(|(id, block_time)| MappingRow::new(TransactionId::new(id), block_time))
            .collect())
    }

    async fn at_block_time(
        &mut self,
        address: &Address,
        block_time: EpochMillis,
    ) -> Result<Vec<TransactionId>, UpstreamError> {
        let ids: Vec<String> = sqlx::query_scalar(AT_BLOCK_TIME)
            .bind(address.as_str())
            .bind(block_time)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(db_error)?;
        Ok(ids.into_iter().map(TransactionId::new).collect())
    }

    async fn newest_with_offset(
        &mut self,
        address: &Address,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<TransactionId>, UpstreamError> {
        let ids: Vec<String> = sqlx::query_scalar(NEWEST_WITH_OFFSET)
            .bind(address.as_str())
            .bind(sql_int(limit))
            .bind(sql_int(offset))
            .fetch_all(&mut *self.conn)
            .await
            .map_err(db_error)?;
        Ok(ids.into_iter().map(TransactionId::new).collect())
    }

    async fn count(&mut self, address: &Address) -> Result<u64, UpstreamError> {
        let total: i64 = sqlx::query_scalar(COUNT)
            .bind(address.as_str())
            .fetch_one(&mut *self.conn)
            .await
            .map_err(db_error)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}

#[async_trait]
impl AddressTransactionStore for PgIndex {
    async fn acquire(&self) -> Result<Box<dyn AddressTransactionReader>, UpstreamError> {
        let conn = self.pool.acquire().await.map_err(db_error)?;
        Ok(Box::new(PgReader { conn }))
    }

    async fn ping(&self) -> Result<(), UpstreamError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl ActivityIndex for PgIndex {
    #[instrument(skip(self, payloads), fields(batch = payloads.len()))]
    async fn inactive_payloads(
        &self,
        payloads: &[String],
    ) -> Result<HashSet<String>, UpstreamError> {
        let inactive: Vec<String> = sqlx::query_scalar(INACTIVE_PAYLOADS)
            .bind(payloads.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        debug!(inactive = inactive.len(), "activity lookup done");
        Ok(inactive.into_iter().collect())
    }
}

#[async_trait]
impl AddressNameStore for PgIndex {
    async fn name_of(&self, address: &Address) -> Result<Option<String>, UpstreamError> {
        sqlx::query_scalar(NAME_OF)
            .bind(address.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }
}

impl IndexBackend for PgIndex {
    fn mapping(&self) -> &dyn AddressTransactionStore {
        self
    }

    fn activity(&self) -> &dyn ActivityIndex {
        self
    }

    fn names(&self) -> &dyn AddressNameStore {
        self
    }

    fn transactions(&self) -> &dyn TransactionSearch {
        self
    }
}
