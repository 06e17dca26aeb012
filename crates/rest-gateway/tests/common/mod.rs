//! Shared fakes for the router tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response, StatusCode},
    Router,
};
use parking_lot::Mutex;
use rest_gateway::adapters::InMemoryIndex;
use rest_gateway::domain::network::{
    BalanceEntry, BlockDagInfo, BlueScore, CoinSupply, FeeEstimate, FeeEstimateBucket, NodeInfo,
    Outpoint, ScriptPublicKey, Utxo, UtxoEntry,
};
use rest_gateway::domain::Address;
use rest_gateway::ports::{NodeClient, PriceSource, TimeSource};
use rest_gateway::{build_router, AppState, EpochMillis, GatewayConfig, UpstreamError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

pub const ADDRESS_A: &str = "kaspa:qqkqkzjvr7zwxxmjxjkmxxdwju9kjs6e9u82uh59z07vgaks6gg62v8707g73";
pub const ADDRESS_B: &str = "kaspa:qrzk988gtanp3nf76xkpexwud5cxfmfygqf42hz38pwea74s6qrj75jee85nj";

pub const NOW_MILLIS: EpochMillis = 1_700_000_000_000;

pub struct FixedClock;

impl TimeSource for FixedClock {
    fn now_millis(&self) -> EpochMillis {
        NOW_MILLIS
    }
}

/// Node fake answering from preset values.
pub struct ScriptedNode {
    pub balances: Mutex<HashMap<String, u64>>,
    pub supply: CoinSupply,
    pub fee_estimate: Option<FeeEstimate>,
    pub synced: bool,
    pub online: bool,
    pub rejected: Option<String>,
}

impl Default for ScriptedNode {
    fn default() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            supply: CoinSupply {
                circulating_sompi: 2_456_700_000_000_000_000,
                max_sompi: 2_900_000_000_000_000_000,
            },
            fee_estimate: Some(FeeEstimate {
                priority_bucket: FeeEstimateBucket {
                    feerate: 3.0,
                    estimated_seconds: 0.5,
                },
                normal_buckets: vec![FeeEstimateBucket {
                    feerate: 1.0,
                    estimated_seconds: 2.0,
                }],
                low_buckets: vec![],
            }),
            synced: true,
            online: true,
            rejected: None,
        }
    }
}

impl ScriptedNode {
    fn check(&self) -> Result<(), UpstreamError> {
        if !self.online {
            return Err(UpstreamError::Unavailable("connection refused".into()));
        }
        if let Some(reason) = &self.rejected {
            return Err(UpstreamError::Rejected(reason.clone()));
        }
        Ok(())
    }

    pub fn with_balance(self, address: &str, balance: u64) -> Self {
        self.balances.lock().insert(address.to_string(), balance);
        self
    }
}

#[async_trait]
impl NodeClient for ScriptedNode {
    async fn get_balance(&self, address: &Address) -> Result<u64, UpstreamError> {
        self.check()?;
        Ok(self
            .balances
            .lock()
            .get(address.as_str())
            .copied()
            .unwrap_or(0))
    }

    async fn get_balances(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<BalanceEntry>, UpstreamError> {
        self.check()?;
        let balances = self.balances.lock();
        Ok(addresses
            .iter()
            .map(|a| BalanceEntry {
                address: a.to_string(),
                balance: balances.get(a.as_str()).copied().unwrap_or(0),
            })
            .collect())
    }

    async fn get_utxos(&self, addresses: &[Address]) -> Result<Vec<Utxo>, UpstreamError> {
        self.check()?;
        // One entry for the requested address and one foreign entry.
        let owner = addresses
            .first()
            .map(|a| a.to_string())
            .unwrap_or_default();
        Ok([owner, "kaspa:someoneelse".to_string()]
            .into_iter()
            .map(|address| Utxo {
                address,
                outpoint: Outpoint {
                    transaction_id: "ef62efbc".into(),
                    index: 1,
                },
                utxo_entry: UtxoEntry {
                    amount: "11501593788".into(),
                    script_public_key: ScriptPublicKey {
                        script_public_key: "20c5629c".into(),
                    },
                    block_daa_score: "18867232".into(),
                    is_coinbase: false,
                },
            })
            .collect())
    }

    async fn get_coin_supply(&self) -> Result<CoinSupply, UpstreamError> {
        self.check()?;
        Ok(self.supply)
    }

    async fn get_fee_estimate(&self) -> Result<Option<FeeEstimate>, UpstreamError> {
        self.check()?;
        Ok(self.fee_estimate.clone())
    }

    async fn get_block_dag_info(&self) -> Result<BlockDagInfo, UpstreamError> {
        self.check()?;
        Ok(BlockDagInfo {
            network_name: "kaspa-mainnet".into(),
            block_count: "261357".into(),
            header_count: "23138783".into(),
            tip_hashes: vec!["efdbe104".into()],
            difficulty: 3887079905014.09,
            past_median_time: "1656456088196".into(),
            virtual_parent_hashes: vec!["6affbe62".into()],
            pruning_point_hash: "5d32a940".into(),
            virtual_daa_score: "19989984".into(),
        })
    }

    async fn get_info(&self) -> Result<NodeInfo, UpstreamError> {
        if !self.online {
            return Err(UpstreamError::Unavailable("connection refused".into()));
        }
        Ok(NodeInfo {
            p2p_id: "abc".into(),
            mempool_size: "1".into(),
            server_version: "0.12.2".into(),
            is_utxo_indexed: true,
            is_synced: self.synced,
        })
    }

    async fn get_sink_blue_score(&self) -> Result<BlueScore, UpstreamError> {
        self.check()?;
        Ok(BlueScore {
            blue_score: 260_890,
        })
    }
}

pub struct FixedPrice(pub f64);

#[async_trait]
impl PriceSource for FixedPrice {
    async fn usd_price(&self) -> Result<f64, UpstreamError> {
        Ok(self.0)
    }
}

/// Router over `index` (or no database) and `node`.
pub fn app(index: Option<InMemoryIndex>, node: ScriptedNode) -> Router {
    app_with_config(index, node, GatewayConfig::default())
}

pub fn app_with_config(
    index: Option<InMemoryIndex>,
    node: ScriptedNode,
    config: GatewayConfig,
) -> Router {
    let mut state = AppState::new(config, Arc::new(node), Arc::new(FixedPrice(0.125)))
        .with_clock(Arc::new(FixedClock));
    if let Some(index) = index {
        state = state.with_index(Arc::new(index));
    }
    build_router(state)
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

pub fn assert_status(response: &Response<Body>, status: StatusCode) {
    assert_eq!(response.status(), status, "unexpected status");
}
