//! Hydration of paged transaction ids into full records.

use crate::domain::error::UpstreamError;
use crate::domain::types::{
    dedup_ids, ResolveDepth, TransactionId, TransactionRecord, TxInput, TxOutput,
};
use crate::ports::TransactionSearch;
use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Top-level record fields a client may select.
pub const RECORD_FIELDS: [&str; 12] = [
    "subnetwork_id",
    "transaction_id",
    "hash",
    "mass",
    "payload",
    "block_hash",
    "block_time",
    "is_accepted",
    "accepting_block_hash",
    "accepting_block_blue_score",
    "inputs",
    "outputs",
];

/// Selection of top-level record fields. Empty selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMask {
    fields: HashSet<String>,
}

impl FieldMask {
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list such as `"transaction_id,block_time"`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut fields = HashSet::new();
        for name in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            if !RECORD_FIELDS.contains(&name) {
                return Err(format!("unknown field '{}'", name));
            }
            fields.insert(name.to_string());
        }
        Ok(Self { fields })
    }

    pub fn is_all(&self) -> bool {
        self.fields.is_empty()
    }

    fn keeps(&self, field: &str) -> bool {
        self.is_all() || self.fields.contains(field)
    }

    /// Clear every field outside the selection.
    pub fn apply(&self, mut record: TransactionRecord) -> TransactionRecord {
        if self.is_all() {
            return record;
        }
        macro_rules! mask {
            ($($field:ident),*) => {
                $(if !self.keeps(stringify!($field)) {
                    record.$field = None;
                })*
            };
        }
        mask!(
            subnetwork_id,
            transaction_id,
            hash,
            mass,
            payload,
            block_hash,
            block_time,
            is_accepted,
            accepting_block_hash,
            accepting_block_blue_score,
            inputs,
            outputs
        );
        record
    }
}

/// Newest block time first (records without one last), then by id.
fn record_order(a: &TransactionRecord, b: &TransactionRecord) -> Ordering {
    Reverse(a.block_time)
        .cmp(&Reverse(b.block_time))
        .then_with(|| a.transaction_id.cmp(&b.transaction_id))
}

/// Fill the previous-outpoint fields of `inputs` to `depth`, looking spent
/// outputs up by `(transaction id, output index)`. Inputs whose output is
/// unknown keep only the reference.
pub fn resolve_previous_outpoints<F>(inputs: &mut [TxInput], depth: ResolveDepth, spent_output: F)
where
    F: Fn(&str, u32) -> Option<TxOutput>,
{
    for input in inputs {
        input.previous_outpoint_resolved = None;
        input.previous_outpoint_address = None;
        input.previous_outpoint_amount = None;
        if depth == ResolveDepth::No {
            continue;
        }
        let Some(output) = spent_output(&input.previous_outpoint_hash, input.previous_outpoint_index)
        else {
            continue;
        };
        input.previous_outpoint_address = output.script_public_key_address.clone();
        input.previous_outpoint_amount = Some(output.amount);
        if depth == ResolveDepth::Full {
            input.previous_outpoint_resolved = Some(output);
        }
    }
}

/// Resolves id pages into ordered, masked records through the external
/// transaction search.
pub struct ResponseAssembler<'a> {
    search: &'a dyn TransactionSearch,
}

impl<'a> ResponseAssembler<'a> {
    pub fn new(search: &'a dyn TransactionSearch) -> Self {
        Self { search }
    }

    /// Records for `ids`, newest first. Ids the search does not know are
    /// left out; an empty id list never reaches the search.
    #[instrument(skip(self, ids, mask), fields(ids = ids.len()))]
    pub async fn hydrate(
        &self,
        ids: &[TransactionId],
        mask: &FieldMask,
        resolve: ResolveDepth,
    ) -> Result<Vec<TransactionRecord>, UpstreamError> {
        let ids = dedup_ids(ids.iter().cloned());
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = self.search.search(&ids, resolve).await?;
        if records.len() < ids.len() {
            debug!(
                requested = ids.len(),
                found = records.len(),
                "some transactions not resolved"
            );
        }
        records.sort_by(record_order);
        Ok(records.into_iter().map(|r| mask.apply(r)).collect())
    }
}
