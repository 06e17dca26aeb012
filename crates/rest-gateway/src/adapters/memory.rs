//! In-memory index backend.
//!
//! Implements every database port over plain collections. Used by the test
//! suites and for running the gateway without PostgreSQL.

use crate::domain::address::{split_payload, Address};
use crate::domain::assembler::resolve_previous_outpoints;
use crate::domain::error::UpstreamError;
use crate::domain::types::{
    newest_first, EpochMillis, MappingRow, ResolveDepth, TransactionId, TransactionRecord,
    TxOutput,
};
use crate::ports::{
    ActivityIndex, AddressNameStore, AddressTransactionReader, AddressTransactionStore,
    IndexBackend, TransactionSearch,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct IndexState {
    mappings: HashMap<String, Vec<MappingRow>>,
    active_payloads: HashSet<String>,
    names: HashMap<String, String>,
    transactions: HashMap<TransactionId, TransactionRecord>,
}

#[derive(Default)]
struct Inner {
    state: RwLock<IndexState>,
    offline: AtomicBool,
    open_readers: AtomicUsize,
    mapping_queries: AtomicUsize,
}

impl Inner {
    fn check_online(&self) -> Result<(), UpstreamError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(UpstreamError::Unavailable("in-memory index offline".into()))
        } else {
            Ok(())
        }
    }

    /// Rows for `address` in page order.
    fn sorted_rows(&self, address: &Address) -> Vec<MappingRow> {
        let state = self.state.read();
        let mut rows = state
            .mappings
            .get(address.as_str())
            .cloned()
            .unwrap_or_default();
        rows.sort_by(newest_first);
        rows
    }
}

/// Shared in-memory index. Clones see the same data.
#[derive(Clone, Default)]
pub struct InMemoryIndex {
    inner: Arc<Inner>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `transaction_id` to `address` at `block_time` and mark the address
    /// payload as active.
    pub fn insert_mapping(
        &self,
        address: &str,
        transaction_id: impl Into<TransactionId>,
        block_time: EpochMillis,
    ) {
        let mut state = self.inner.state.write();
        state
            .mappings
            .entry(address.to_string())
            .or_default()
            .push(MappingRow::new(transaction_id, block_time));
        if let Ok((_, payload)) = split_payload(address) {
            state.active_payloads.insert(payload.to_string());
        }
    }

    pub fn mark_active(&self, payload: &str) {
        self.inner
            .state
            .write()
            .active_payloads
            .insert(payload.to_string());
    }

    pub fn set_name(&self, address: &str, name: &str) {
        self.inner
            .state
            .write()
            .names
            .insert(address.to_string(), name.to_string());
    }

    /// Store a record. Records without an id are ignored.
    pub fn insert_transaction(&self, record: TransactionRecord) {
        if let Some(id) = record.transaction_id.as_deref() {
            self.inner
                .state
                .write()
                .transactions
                .insert(TransactionId::new(id), record);
        }
    }

    /// Make every subsequent call fail with [`UpstreamError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Readers acquired and not yet dropped.
    pub fn open_readers(&self) -> usize {
        self.inner.open_readers.load(Ordering::SeqCst)
    }

    /// Mapping queries issued through readers so far.
    pub fn mapping_queries(&self) -> usize {
        self.inner.mapping_queries.load(Ordering::SeqCst)
    }

    fn resolve(&self, record: &TransactionRecord, resolve: ResolveDepth) -> TransactionRecord {
        let mut record = record.clone();
        let state = self.inner.state.read();
        let spent_output = |hash: &str, index: u32| -> Option<TxOutput> {
            state
                .transactions
                .get(&TransactionId::new(hash))
                .and_then(|tx| tx.outputs.as_ref())
                .and_then(|outputs| outputs.iter().find(|o| o.index == index))
                .cloned()
        };

        if let Some(inputs) = record.inputs.as_mut() {
            resolve_previous_outpoints(inputs, resolve, spent_output);
        }
        record
    }
}

/// Reader over the shared state. Dropping it releases the slot.
struct InMemoryReader {
    inner: Arc<Inner>,
}

impl Drop for InMemoryReader {
    fn drop(&mut self) {
        self.inner.open_readers.fetch_sub(1, Ordering::SeqCst);
    }
}

impl InMemoryReader {
    fn begin_query(&self) -> Result<(), UpstreamError> {
        self.inner.check_online()?;
        self.inner.mapping_queries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl AddressTransactionReader for InMemoryReader {
    async fn newest_before(
        &mut self,
        address: &Address,
        before: EpochMillis,
        limit: u32,
    ) -> Result<Vec<MappingRow>, UpstreamError> {
        self.begin_query()?;
        Ok(self
            .inner
            .sorted_rows(address)
            .into_iter()
            .filter(|row| row.block_time < before)
            .take(limit as usize)
            .collect())
    }

    async fn at_block_time(
        &mut self,
        address: &Address,
        block_time: EpochMillis,
    ) -> Result<Vec<TransactionId>, UpstreamError> {
        self.begin_query()?;
        Ok(self
            .inner
            .sorted_rows(address)
            .into_iter()
            .filter(|row| row.block_time == block_time)
            .map(|row| row.transaction_id)
            .collect())
    }

    async fn newest_with_offset(
        &mut self,
        address: &Address,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<TransactionId>, UpstreamError> {
        self.begin_query()?;
        Ok(self
            .inner
            .sorted_rows(address)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|row| row.transaction_id)
            .collect())
    }

    async fn count(&mut self, address: &Address) -> Result<u64, UpstreamError> {
        self.begin_query()?;
        let state = self.inner.state.read();
        Ok(state
            .mappings
            .get(address.as_str())
            .map_or(0, |rows| rows.len() as u64))
    }
}

#[async_trait]
impl AddressTransactionStore for InMemoryIndex {
    async fn acquire(&self) -> Result<Box<dyn AddressTransactionReader>, UpstreamError> {
        self.inner.check_online()?;
        self.inner.open_readers.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryReader {
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn ping(&self) -> Result<(), UpstreamError> {
        self.inner.check_online()
    }
}

#[async_trait]
impl ActivityIndex for InMemoryIndex {
    async fn inactive_payloads(
        &self,
        payloads: &[String],
    ) -> Result<HashSet<String>, UpstreamError> {
        self.inner.check_online()?;
        let state = self.inner.state.read();
        Ok(payloads
            .iter()
            .filter(|p| !state.active_payloads.contains(p.as_str()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AddressNameStore for InMemoryIndex {
    async fn name_of(&self, address: &Address) -> Result<Option<String>, UpstreamError> {
        self.inner.check_online()?;
        Ok(self.inner.state.read().names.get(address.as_str()).cloned())
    }
}

#[async_trait]
impl TransactionSearch for InMemoryIndex {
    async fn search(
        &self,
        ids: &[TransactionId],
        resolve: ResolveDepth,
    ) -> Result<Vec<TransactionRecord>, UpstreamError> {
        self.inner.check_online()?;
        let found: Vec<TransactionRecord> = {
            let state = self.inner.state.read();
            ids.iter()
                .filter_map(|id| state.transactions.get(id).cloned())
                .collect()
        };
        Ok(found
            .iter()
            .map(|record| self.resolve(record, resolve))
            .collect())
    }
}

impl IndexBackend for InMemoryIndex {
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
