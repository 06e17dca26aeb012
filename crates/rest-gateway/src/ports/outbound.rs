//! # Outbound Ports (Driven Ports)
//!
//! Interfaces the gateway needs from the index database, the node and the
//! price feed. Adapters live in `crate::adapters` (in-memory) and in the
//! runtime crate (PostgreSQL, node HTTP bridge).

use crate::domain::address::Address;
use crate::domain::error::UpstreamError;
use crate::domain::network::{
    BalanceEntry, BlockDagInfo, BlueScore, CoinSupply, FeeEstimate, NodeInfo, Utxo,
};
use crate::domain::types::{EpochMillis, MappingRow, ResolveDepth, TransactionId, TransactionRecord};
use async_trait::async_trait;
use std::collections::HashSet;

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> EpochMillis;
}

/// System time implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> EpochMillis {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as EpochMillis)
            // Clock before Unix epoch
            .unwrap_or(0)
    }
}

/// Source of scoped readers over the address -> transaction mapping.
#[async_trait]
pub trait AddressTransactionStore: Send + Sync {
    /// Acquire a reader. The underlying connection is released when the
    /// reader is dropped.
    async fn acquire(&self) -> Result<Box<dyn AddressTransactionReader>, UpstreamError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), UpstreamError>;
}

/// Queries against the mapping, all ordered by block time descending then
/// transaction id ascending.
#[async_trait]
pub trait AddressTransactionReader: Send {
    /// Up to `limit` rows with `block_time < before`.
    async fn newest_before(
        &mut self,
        address: &Address,
        before: EpochMillis,
        limit: u32,
    ) -> Result<Vec<MappingRow>, UpstreamError>;

    /// Every id mapped to `address` at exactly `block_time`.
    async fn at_block_time(
        &mut self,
        address: &Address,
        block_time: EpochMillis,
    ) -> Result<Vec<TransactionId>, UpstreamError>;

    /// `limit` ids after skipping `offset`.
    async fn newest_with_offset(
        &mut self,
        address: &Address,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<TransactionId>, UpstreamError>;

    /// Number of mapping rows for `address`.
    async fn count(&mut self, address: &Address) -> Result<u64, UpstreamError>;
}

/// Set of address payloads that have appeared in any transaction.
#[async_trait]
pub trait ActivityIndex: Send + Sync {
    /// The subset of `payloads` with no recorded activity.
    async fn inactive_payloads(&self, payloads: &[String])
        -> Result<HashSet<String>, UpstreamError>;
}

/// Human-readable labels for well-known addresses.
#[async_trait]
pub trait AddressNameStore: Send + Sync {
    async fn name_of(&self, address: &Address) -> Result<Option<String>, UpstreamError>;
}

/// Transaction detail resolution.
#[async_trait]
pub trait TransactionSearch: Send + Sync {
    /// Records for the known ids among `ids`, in no particular order. Unknown
    /// ids are omitted.
    async fn search(
        &self,
        ids: &[TransactionId],
        resolve: ResolveDepth,
    ) -> Result<Vec<TransactionRecord>, UpstreamError>;
}

/// Everything the gateway reads from the index database.
pub trait IndexBackend: Send + Sync {
    fn mapping(&self) -> &dyn AddressTransactionStore;
    fn activity(&self) -> &dyn ActivityIndex;
    fn names(&self) -> &dyn AddressNameStore;
    fn transactions(&self) -> &dyn TransactionSearch;
}

/// Node RPC operations used by the info and balance endpoints.
#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn get_balance(&self, address: &Address) -> Result<u64, UpstreamError>;

    async fn get_balances(&self, addresses: &[Address])
        -> Result<Vec<BalanceEntry>, UpstreamError>;

    async fn get_utxos(&self, addresses: &[Address]) -> Result<Vec<Utxo>, UpstreamError>;

    async fn get_coin_supply(&self) -> Result<CoinSupply, UpstreamError>;

    /// `None` when the node is too old to estimate fees.
    async fn get_fee_estimate(&self) -> Result<Option<FeeEstimate>, UpstreamError>;

    async fn get_block_dag_info(&self) -> Result<BlockDagInfo, UpstreamError>;

    async fn get_info(&self) -> Result<NodeInfo, UpstreamError>;

    async fn get_sink_blue_score(&self) -> Result<BlueScore, UpstreamError>;
}

/// Coin price used for market cap figures.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn usd_price(&self) -> Result<f64, UpstreamError>;
}
