//! Transaction detail lookup against the indexer's transaction tables.

use super::postgres::{db_error, PgIndex};
use async_trait::async_trait;
use rest_gateway::domain::resolve_previous_outpoints;
use rest_gateway::ports::TransactionSearch;
use rest_gateway::{
    ResolveDepth, TransactionId, TransactionRecord, TxInput, TxOutput, UpstreamError,
};
use std::collections::HashMap;
use tracing::{debug, instrument};

const TRANSACTIONS: &str = "\
    SELECT t.transaction_id, t.subnetwork_id, t.hash, t.mass::text AS mass, t.payload, t.block_hash, \
           t.block_time, t.is_accepted, t.accepting_block_hash, \
           b.blue_score AS accepting_block_blue_score \
    FROM transactions t \
    LEFT JOIN blocks b ON b.hash = t.accepting_block_hash \
    WHERE t.transaction_id = ANY($1)";

const INPUTS: &str = "\
    SELECT transaction_id, \"index\"::int AS index, previous_outpoint_hash, \
           previous_outpoint_index::int AS previous_outpoint_index, \
           signature_script, sig_op_count::int AS sig_op_count \
    FROM transactions_inputs \
    WHERE transaction_id = ANY($1) \
    ORDER BY transaction_id, \"index\"";

const OUTPUTS: &str = "\
    SELECT transaction_id, \"index\"::int AS index, amount::bigint AS amount, \
           script_public_key, script_public_key_address, script_public_key_type \
    FROM transactions_outputs \
    WHERE transaction_id = ANY($1) \
    ORDER BY transaction_id, \"index\"";

/// Outputs spent by the given `(hash, index)` outpoints.
const SPENT_OUTPUTS: &str = "\
    SELECT o.transaction_id, o.\"index\"::int AS index, o.amount::bigint AS amount, \
           o.script_public_key, o.script_public_key_address, o.script_public_key_type \
    FROM transactions_outputs o \
    JOIN UNNEST($1::text[], $2::int[]) AS p(hash, idx) \
      ON o.transaction_id = p.hash AND o.\"index\" = p.idx";

#[derive(sqlx::FromRow)]
struct TransactionRow {
    transaction_id: String,
    subnetwork_id: Option<String>,
    hash: Option<String>,
    mass: Option<String>,
    payload: Option<String>,
    block_hash: Option<Vec<String>>,
    block_time: Option<i64>,
    is_accepted: Option<bool>,
    accepting_block_hash: Option<String>,
    accepting_block_blue_score: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct InputRow {
    transaction_id: String,
    index: i32,
    previous_outpoint_hash: String,
    previous_outpoint_index: i32,
    signature_script: Option<String>,
    sig_op_count: Option<i32>,
}

#[derive(sqlx::FromRow)]
struct OutputRow {
    transaction_id: String,
    index: i32,
    amount: i64,
    script_public_key: Option<String>,
    script_public_key_address: Option<String>,
    script_public_key_type: Option<String>,
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

impl From<InputRow> for TxInput {
    fn from(row: InputRow) -> Self {
        Self {
            transaction_id: row.transaction_id,
            index: non_negative(row.index),
            previous_outpoint_hash: row.previous_outpoint_hash,
            previous_outpoint_index: non_negative(row.previous_outpoint_index),
            signature_script: row.signature_script,
            sig_op_count: row.sig_op_count.map(non_negative),
            ..Default::default()
        }
    }
}

impl From<OutputRow> for TxOutput {
    fn from(row: OutputRow) -> Self {
        Self {
            transaction_id: row.transaction_id,
            index: non_negative(row.index),
            amount: u64::try_from(row.amount).unwrap_or(0),
            script_public_key: row.script_public_key,
            script_public_key_address: row.script_public_key_address,
            script_public_key_type: row.script_public_key_type,
        }
    }
}

/// Join transaction rows with their inputs and outputs.
fn assemble(
    transactions: Vec<TransactionRow>,
    inputs: Vec<InputRow>,
    outputs: Vec<OutputRow>,
) -> Vec<TransactionRecord> {
    let mut inputs_by_tx: HashMap<String, Vec<TxInput>> = HashMap::new();
    for row in inputs {
        inputs_by_tx
            .entry(row.transaction_id.clone())
            .or_default()
            .push(row.into());
    }
    let mut outputs_by_tx: HashMap<String, Vec<TxOutput>> = HashMap::new();
    for row in outputs {
        outputs_by_tx
            .entry(row.transaction_id.clone())
            .or_default()
            .push(row.into());
    }

    transactions
        .into_iter()
        .map(|tx| TransactionRecord {
            inputs: Some(inputs_by_tx.remove(&tx.transaction_id).unwrap_or_default()),
            outputs: Some(outputs_by_tx.remove(&tx.transaction_id).unwrap_or_default()),
            subnetwork_id: tx.subnetwork_id,
            hash: tx.hash,
            mass: tx.mass,
            payload: tx.payload,
            block_hash: tx.block_hash,
            block_time: tx.block_time,
            is_accepted: tx.is_accepted,
            accepting_block_hash: tx.accepting_block_hash,
            accepting_block_blue_score: tx
                .accepting_block_blue_score
                .and_then(|s| u64::try_from(s).ok()),
            transaction_id: Some(tx.transaction_id),
        })
        .collect()
}

impl PgIndex {
    async fn spent_outputs(
        &self,
        records: &[TransactionRecord],
    ) -> Result<HashMap<(String, u32), TxOutput>, UpstreamError> {
        let (hashes, indexes): (Vec<String>, Vec<i32>) = records
            .iter()
            .flat_map(|r| r.inputs.iter().flatten())
            .map(|i| {
                (
                    i.previous_outpoint_hash.clone(),
                    i32::try_from(i.previous_outpoint_index).unwrap_or(i32::MAX),
                )
            })
            .unzip();
        if hashes.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<OutputRow> = sqlx::query_as(SPENT_OUTPUTS)
            .bind(hashes)
            .bind(indexes)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let output = TxOutput::from(row);
                ((output.transaction_id.clone(), output.index), output)
            })
            .collect())
    }
}

#[async_trait]
impl TransactionSearch for PgIndex {
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn search(
        &self,
        ids: &[TransactionId],
        resolve: ResolveDepth,
    ) -> Result<Vec<TransactionRecord>, UpstreamError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();

        let transactions: Vec<TransactionRow> = sqlx::query_as(TRANSACTIONS)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        let inputs: Vec<InputRow> = sqlx::query_as(INPUTS)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        let outputs: Vec<OutputRow> = sqlx::query_as(OUTPUTS)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        let mut records = assemble(transactions, inputs, outputs);
        if resolve != ResolveDepth::No {
            let spent = self.spent_outputs(&records).await?;
            debug!(resolved = spent.len(), "previous outpoints loaded");
            for record in &mut records {
                if let Some(inputs) = record.inputs.as_mut() {
                    resolve_previous_outpoints(inputs, resolve, |hash, index| {
                        spent.get(&(hash.to_string(), index)).cloned()
                    });
                }
            }
        }
        Ok(records)
    }
}
