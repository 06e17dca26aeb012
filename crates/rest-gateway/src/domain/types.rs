//! Core types for address history paging and transaction hydration.
//!
//! Field names of the serialized records follow the indexer's column names so
//! existing clients keep working.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;

/// Opaque transaction identifier (hex encoded hash).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One row of the address -> transaction mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingRow {
    pub transaction_id: TransactionId,
    pub block_time: EpochMillis,
}

impl MappingRow {
    pub fn new(transaction_id: impl Into<TransactionId>, block_time: EpochMillis) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            block_time,
        }
    }
}

/// Page order: newest block time first, ties broken by ascending id.
pub fn newest_first(a: &MappingRow, b: &MappingRow) -> Ordering {
    b.block_time
        .cmp(&a.block_time)
        .then_with(|| a.transaction_id.cmp(&b.transaction_id))
}

/// Requested page size, always within `1..=500`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageLimit(u32);

impl PageLimit {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 500;
    pub const DEFAULT: PageLimit = PageLimit(50);

    pub fn new(limit: u32) -> Result<Self, String> {
        if (Self::MIN..=Self::MAX).contains(&limit) {
            Ok(Self(limit))
        } else {
            Err(format!(
                "limit must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                limit
            ))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for PageLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for PageLimit {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PageLimit::new(value)
    }
}

impl From<PageLimit> for u32 {
    fn from(limit: PageLimit) -> Self {
        limit.0
    }
}

/// How much of each input's previous outpoint gets resolved during hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveDepth {
    /// Previous outpoints are left as references.
    #[default]
    No,
    /// Address and amount of the spent output.
    Light,
    /// The complete spent output record.
    Full,
}

/// Result of one cursor page computation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CursorPage {
    /// Distinct ids in page order.
    pub transaction_ids: Vec<TransactionId>,
    /// Smallest block time seen; the `before` cursor for the next page.
    /// `None` for an empty page, which ends a paging loop.
    pub oldest_block_time: Option<EpochMillis>,
}

impl CursorPage {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Order rows with [`newest_first`] and drop repeated ids.
    pub fn from_rows(mut rows: Vec<MappingRow>, oldest_block_time: EpochMillis) -> Self {
        rows.sort_by(newest_first);
        Self {
            transaction_ids: dedup_ids(rows.into_iter().map(|row| row.transaction_id)),
            oldest_block_time: Some(oldest_block_time),
        }
    }

    pub fn count(&self) -> usize {
        self.transaction_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_ids.is_empty()
    }
}

/// Keep the first occurrence of every id, preserving order.
pub fn dedup_ids(ids: impl IntoIterator<Item = TransactionId>) -> Vec<TransactionId> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// A transaction as returned by the detail resolution service.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub subnetwork_id: Option<String>,
    pub transaction_id: Option<String>,
    pub hash: Option<String>,
    pub mass: Option<String>,
    pub payload: Option<String>,
    pub block_hash: Option<Vec<String>>,
    pub block_time: Option<EpochMillis>,
    pub is_accepted: Option<bool>,
    pub accepting_block_hash: Option<String>,
    pub accepting_block_blue_score: Option<u64>,
    pub inputs: Option<Vec<TxInput>>,
    pub outputs: Option<Vec<TxOutput>>,
}

/// Transaction input. The `previous_outpoint_*` resolution fields are only
/// filled for [`ResolveDepth::Light`] and [`ResolveDepth::Full`].
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TxInput {
    pub transaction_id: String,
    pub index: u32,
    pub previous_outpoint_hash: String,
    pub previous_outpoint_index: u32,
    pub previous_outpoint_resolved: Option<TxOutput>,
    pub previous_outpoint_address: Option<String>,
    pub previous_outpoint_amount: Option<u64>,
    pub signature_script: Option<String>,
    pub sig_op_count: Option<u32>,
}

/// Transaction output.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TxOutput {
    pub transaction_id: String,
    pub index: u32,
    pub amount: u64,
    pub script_public_key: Option<String>,
    pub script_public_key_address: Option<String>,
    pub script_public_key_type: Option<String>,
}

/// Entry of the `/addresses/active` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressActivity {
    pub address: String,
    pub active: bool,
}

/// `/addresses/{address}/transactions-count` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCount {
    pub total: u64,
}

/// `/addresses/{address}/name` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressName {
    pub address: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_breaks_ties_by_id() {
        let mut rows = vec![
            MappingRow::new("b", 10),
            MappingRow::new("a", 10),
            MappingRow::new("c", 20),
        ];
        rows.sort_by(newest_first);
        let ids: Vec<_> = rows.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_page_limit_bounds() {
        assert!(PageLimit::new(0).is_err());
        assert!(PageLimit::new(501).is_err());
        assert_eq!(PageLimit::new(1).unwrap().get(), 1);
        assert_eq!(PageLimit::new(500).unwrap().get(), 500);
        assert_eq!(PageLimit::default().get(), 50);
    }

    #[test]
    fn test_resolve_depth_wire_names() {
        assert_eq!(serde_json::to_string(&ResolveDepth::No).unwrap(), "\"no\"");
        let light: ResolveDepth = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(light, ResolveDepth::Light);
        assert!(serde_json::from_str::<ResolveDepth>("\"none\"").is_err());
    }

    #[test]
    fn test_cursor_page_dedups_and_orders() {
        let rows = vec![
            MappingRow::new("x", 5),
            MappingRow::new("y", 9),
            MappingRow::new("x", 5),
        ];
        let page = CursorPage::from_rows(rows, 5);
        assert_eq!(page.count(), 2);
        assert_eq!(
            page.transaction_ids,
            vec![TransactionId::from("y"), TransactionId::from("x")]
        );
        assert_eq!(page.oldest_block_time, Some(5));
    }

    #[test]
    fn test_record_skips_unset_fields() {
        let record = TransactionRecord {
            transaction_id: Some("abc".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({ "transaction_id": "abc" }));

        let input = TxInput {
            transaction_id: "abc".into(),
            previous_outpoint_hash: "prev".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "transaction_id": "abc",
                "index": 0,
                "previous_outpoint_hash": "prev",
                "previous_outpoint_index": 0
            })
        );
    }
}
