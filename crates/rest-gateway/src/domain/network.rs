//! Node-sourced network data and the arithmetic derived from it.
//!
//! The node encodes 64-bit integers as strings in some responses and as
//! numbers in others, so integer fields accept both.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use sha2::{Digest, Sha256};

/// Sompi per coin.
pub const SOMPI_PER_COIN: f64 = 100_000_000.0;

/// Balance of one address as reported by the node.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub address: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub balance: u64,
}

/// Outpoint of an unspent output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outpoint {
    pub transaction_id: String,
    #[serde(default)]
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptPublicKey {
    pub script_public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoEntry {
    pub amount: String,
    pub script_public_key: ScriptPublicKey,
    pub block_daa_score: String,
    #[serde(default)]
    pub is_coinbase: bool,
}

/// An unspent output owned by `address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    pub address: String,
    pub outpoint: Outpoint,
    pub utxo_entry: UtxoEntry,
}

/// Coin supply in sompi.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinSupply {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub circulating_sompi: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub max_sompi: u64,
}

impl CoinSupply {
    pub fn circulating_coins(&self) -> f64 {
        self.circulating_sompi as f64 / SOMPI_PER_COIN
    }
}

/// `/info/coinsupply` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinSupplyResponse {
    pub circulating_supply: String,
    pub total_supply: String,
    pub max_supply: String,
}

impl From<CoinSupply> for CoinSupplyResponse {
    fn from(supply: CoinSupply) -> Self {
        Self {
            circulating_supply: supply.circulating_sompi.to_string(),
            total_supply: supply.circulating_sompi.to_string(),
            max_supply: supply.max_sompi.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimateBucket {
    pub feerate: f64,
    pub estimated_seconds: f64,
}

/// Fee-rate buckets, values in sompi/gram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimate {
    pub priority_bucket: FeeEstimateBucket,
    pub normal_buckets: Vec<FeeEstimateBucket>,
    pub low_buckets: Vec<FeeEstimateBucket>,
}

/// Global block-DAG information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDagInfo {
    pub network_name: String,
    pub block_count: String,
    pub header_count: String,
    pub tip_hashes: Vec<String>,
    pub difficulty: f64,
    pub past_median_time: String,
    pub virtual_parent_hashes: Vec<String>,
    pub pruning_point_hash: String,
    pub virtual_daa_score: String,
}

/// Raw node info. `p2p_id` is never exposed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub p2p_id: String,
    pub mempool_size: String,
    pub server_version: String,
    pub is_utxo_indexed: bool,
    pub is_synced: bool,
}

/// `/info/kaspad` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfoResponse {
    pub mempool_size: String,
    pub server_version: String,
    pub is_utxo_indexed: bool,
    pub is_synced: bool,
    pub p2p_id_hashed: String,
}

impl From<NodeInfo> for NodeInfoResponse {
    fn from(info: NodeInfo) -> Self {
        Self {
            p2p_id_hashed: hex::encode(Sha256::digest(info.p2p_id.as_bytes())),
            mempool_size: info.mempool_size,
            server_version: info.server_version,
            is_utxo_indexed: info.is_utxo_indexed,
            is_synced: info.is_synced,
        }
    }
}

/// `/info/virtual-chain-blue-score` response.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueScore {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub blue_score: u64,
}

/// Render a float the way clients of the plain-text endpoints expect: the
/// shortest round-trip representation, always with a decimal point.
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') && !text.contains('e') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Circulating supply as plain text, optionally in billions (2 decimals).
pub fn circulating_text(supply: &CoinSupply, in_billion: bool) -> String {
    let coins = supply.circulating_coins();
    if in_billion {
        format_float(round_to(coins / 1_000_000_000.0, 2))
    } else {
        format_float(coins)
    }
}

/// Market capitalization in USD, rounded to a whole number.
pub fn market_cap(supply: &CoinSupply, price_usd: f64) -> u64 {
    (supply.circulating_coins() * price_usd).round().max(0.0) as u64
}

/// Compact market cap label: millions below one billion, billions above.
pub fn market_cap_label(market_cap: u64) -> String {
    let value = market_cap as f64;
    if value < 1_000_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else {
        format!("{:.1}B", value / 1_000_000_000.0)
    }
}
