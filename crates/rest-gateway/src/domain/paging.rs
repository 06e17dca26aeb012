//! Address history paging.
//!
//! The cursor pager walks history by block time: each page returns the oldest
//! block time it saw, and the caller passes it back as `before` for the next
//! page. When a page is full, every transaction sharing that oldest block
//! time is folded into it, so a same-time cluster is never split across
//! pages.

use crate::domain::address::Address;
use crate::domain::error::UpstreamError;
use crate::domain::types::{CursorPage, EpochMillis, MappingRow, PageLimit, TransactionId};
use crate::ports::{AddressTransactionStore, TimeSource};
use tracing::{debug, instrument};

/// Paging and counting over the address -> transaction mapping.
pub struct AddressHistory<'a> {
    store: &'a dyn AddressTransactionStore,
    clock: &'a dyn TimeSource,
}

impl<'a> AddressHistory<'a> {
    pub fn new(store: &'a dyn AddressTransactionStore, clock: &'a dyn TimeSource) -> Self {
        Self { store, clock }
    }

    /// One cursor page. `before` of `None` or `0` means "now".
    ///
    /// An empty page (no `oldest_block_time`) marks the end of history.
    #[instrument(skip(self, address, limit), fields(address = %address, limit = limit.get()))]
    pub async fn cursor_page(
        &self,
        address: &Address,
        limit: PageLimit,
        before: Option<EpochMillis>,
    ) -> Result<CursorPage, UpstreamError> {
        let before = match before {
            Some(t) if t != 0 => t,
            _ => self.clock.now_millis(),
        };

        // Both steps share one reader; it is dropped on every exit path.
        let mut reader = self.store.acquire().await?;

        let mut rows = reader.newest_before(address, before, limit.get()).await?;
        let Some(oldest) = rows.iter().map(|row| row.block_time).min() else {
            debug!(before, "no rows before cursor");
            return Ok(CursorPage::empty());
        };

        if rows.len() >= limit.as_usize() {
            let cluster = reader.at_block_time(address, oldest).await?;
            debug!(oldest, cluster = cluster.len(), "page full, including boundary cluster");
            rows.extend(cluster.into_iter().map(|id| MappingRow::new(id, oldest)));
        }
        drop(reader);

        let page = CursorPage::from_rows(rows, oldest);
        debug!(count = page.count(), oldest, "cursor page built");
        Ok(page)
    }

    /// `limit` ids after skipping `offset`, newest first. A same-time
    /// cluster at the offset boundary may be split.
    #[instrument(skip(self, address, limit), fields(address = %address, limit = limit.get()))]
    pub async fn offset_page(
        &self,
        address: &Address,
        limit: PageLimit,
        offset: u32,
    ) -> Result<Vec<TransactionId>, UpstreamError> {
        let mut reader = self.store.acquire().await?;
        reader
            .newest_with_offset(address, limit.get(), offset)
            .await
    }

    /// Number of mapping rows for `address`; zero when it has none.
    #[instrument(skip(self, address), fields(address = %address))]
    pub async fn count(&self, address: &Address) -> Result<u64, UpstreamError> {
        let mut reader = self.store.acquire().await?;
        reader.count(address).await
    }
}
