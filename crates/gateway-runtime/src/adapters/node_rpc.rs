//! Node client over the node's HTTP JSON bridge.
//!
//! Every call POSTs `{"<method>Request": {params}}` and expects
//! `{"<method>Response": {...}}` back. An `error` member inside the response
//! is a node-side rejection.

use async_trait::async_trait;
use rest_gateway::domain::network::{
    BalanceEntry, BlockDagInfo, BlueScore, CoinSupply, FeeEstimate, NodeInfo, Utxo,
};
use rest_gateway::domain::Address;
use rest_gateway::ports::NodeClient;
use rest_gateway::UpstreamError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use std::time::Duration;
use tracing::{debug, instrument};

/// Node RPC bridge client.
pub struct NodeRpcClient {
    http: reqwest::Client,
    url: String,
}

impl NodeRpcClient {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| UpstreamError::Unavailable(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// POST one request envelope and return the raw response document.
    async fn exchange(&self, method: &str, params: Value) -> Result<Value, UpstreamError> {
        let mut envelope = Map::new();
        envelope.insert(format!("{method}Request"), params);

        let response = self
            .http
            .post(&self.url)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| transport_error(method, e))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Unavailable(format!(
                "{method}: node answered {}",
                response.status()
            )));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::Malformed(format!("{method}: {e}")))
    }

    #[instrument(skip(self, params))]
    async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, UpstreamError> {
        let document = self.exchange(method, params).await?;
        debug!("node response received");
        decode_envelope(method, document)
    }
}

fn transport_error(method: &str, source: reqwest::Error) -> UpstreamError {
    if source.is_timeout() {
        UpstreamError::Unavailable(format!("{method}: request timed out"))
    } else if source.is_connect() {
        UpstreamError::Unavailable(format!("{method}: connection failed: {source}"))
    } else {
        UpstreamError::Unavailable(format!("{method}: {source}"))
    }
}

/// Extract and decode `<method>Response` from a bridge reply.
pub fn decode_envelope<R: DeserializeOwned>(method: &str, document: Value) -> Result<R, UpstreamError> {
    let key = format!("{method}Response");
    let Value::Object(mut members) = document else {
        return Err(UpstreamError::Malformed(format!("{method}: not an object")));
    };

    let Some(body) = members.remove(&key) else {
        // The bridge may answer with another response type carrying the error.
        if let Some(message) = members.values().find_map(error_message) {
            return Err(UpstreamError::Rejected(message));
        }
        return Err(UpstreamError::Malformed(format!("{method}: missing {key}")));
    };

    if let Some(message) = error_message(&body) {
        return Err(UpstreamError::Rejected(message));
    }
    serde_json::from_value(body).map_err(|e| UpstreamError::Malformed(format!("{method}: {e}")))
}

/// Message of a non-empty `error` member, if any.
fn error_message(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(o) if o.is_empty() => None,
        Value::Object(o) => Some(
            o.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(o.clone()).to_string()),
        ),
        other => Some(other.to_string()),
    }
}

fn address_list(addresses: &[Address]) -> Value {
    json!({ "addresses": addresses.iter().map(Address::as_str).collect::<Vec<_>>() })
}

#[serde_as]
#[derive(Deserialize)]
struct BalanceBody {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    balance: u64,
}

#[derive(Deserialize)]
struct EntriesBody<T> {
    #[serde(default = "Vec::new")]
    entries: Vec<T>,
}

#[derive(Deserialize)]
struct FeeEstimateBody {
    estimate: FeeEstimate,
}

#[async_trait]
impl NodeClient for NodeRpcClient {
    async fn get_balance(&self, address: &Address) -> Result<u64, UpstreamError> {
        let body: BalanceBody = self
            .call("getBalanceByAddress", json!({ "address": address.as_str() }))
            .await?;
        Ok(body.balance)
    }

    async fn get_balances(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<BalanceEntry>, UpstreamError> {
        let body: EntriesBody<BalanceEntry> = self
            .call("getBalancesByAddresses", address_list(addresses))
            .await?;
        Ok(body.entries)
    }

    async fn get_utxos(&self, addresses: &[Address]) -> Result<Vec<Utxo>, UpstreamError> {
        let body: EntriesBody<Utxo> = self
            .call("getUtxosByAddresses", address_list(addresses))
            .await?;
        Ok(body.entries)
    }

    async fn get_coin_supply(&self) -> Result<CoinSupply, UpstreamError> {
        self.call("getCoinSupply", json!({})).await
    }

    async fn get_fee_estimate(&self) -> Result<Option<FeeEstimate>, UpstreamError> {
        let document = self.exchange("getFeeEstimate", json!({})).await?;
        decode_fee_estimate(document)
    }

    async fn get_block_dag_info(&self) -> Result<BlockDagInfo, UpstreamError> {
        self.call("getBlockDagInfo", json!({})).await
    }

    async fn get_info(&self) -> Result<NodeInfo, UpstreamError> {
        self.call("getInfo", json!({})).await
    }

    async fn get_sink_blue_score(&self) -> Result<BlueScore, UpstreamError> {
        self.call("getSinkBlueScore", json!({})).await
    }
}

/// Nodes without an estimator do not know the method at all.
fn decode_fee_estimate(document: Value) -> Result<Option<FeeEstimate>, UpstreamError> {
    if document.get("getFeeEstimateResponse").is_none() {
        debug!("node has no fee estimator");
        return Ok(None);
    }
    let body: FeeEstimateBody = decode_envelope("getFeeEstimate", document)?;
    Ok(Some(body.estimate))
}
