//! `/info/...` handlers. All data comes from the node, except the coin price
//! used for the market cap.

use crate::domain::error::{ApiError, ApiResult};
use crate::domain::network::{
    circulating_text, format_float, market_cap as compute_market_cap, market_cap_label,
    BlockDagInfo, BlueScore, CoinSupplyResponse, FeeEstimate, NodeInfoResponse,
};
use crate::router::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CirculatingQuery {
    #[serde(default)]
    pub in_billion: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketCapQuery {
    #[serde(default, rename = "stringOnly")]
    pub string_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCap {
    pub marketcap: u64,
}

pub async fn coin_supply(State(state): State<AppState>) -> ApiResult<Json<CoinSupplyResponse>> {
    let supply = state.node.get_coin_supply().await?;
    Ok(Json(supply.into()))
}

/// Circulating coins as plain text.
pub async fn circulating_coins(
    State(state): State<AppState>,
    query: Result<Query<CirculatingQuery>, QueryRejection>,
) -> ApiResult<String> {
    let Query(query) = query?;
    let supply = state.node.get_coin_supply().await?;
    Ok(circulating_text(&supply, query.in_billion))
}

/// Total coins as plain text. Equals the circulating amount.
pub async fn total_coins(State(state): State<AppState>) -> ApiResult<String> {
    let supply = state.node.get_coin_supply().await?;
    Ok(format_float(supply.circulating_coins()))
}

pub async fn market_cap(
    State(state): State<AppState>,
    query: Result<Query<MarketCapQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let price = state.price.usd_price().await?;
    let supply = state.node.get_coin_supply().await?;
    let marketcap = compute_market_cap(&supply, price);

    if query.string_only {
        Ok(Json(market_cap_label(marketcap)).into_response())
    } else {
        Ok(Json(MarketCap { marketcap }).into_response())
    }
}

/// Fee-rate buckets in sompi/gram: `fee = feerate * mass(tx)`.
pub async fn fee_estimate(State(state): State<AppState>) -> ApiResult<Json<FeeEstimate>> {
    state
        .node
        .get_fee_estimate()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_implemented("Kaspad does not support fee estimate"))
}

pub async fn block_dag(State(state): State<AppState>) -> ApiResult<Json<BlockDagInfo>> {
    Ok(Json(state.node.get_block_dag_info().await?))
}

/// Same payload as `/info/blockdag`.
pub async fn network(state: State<AppState>) -> ApiResult<Json<BlockDagInfo>> {
    block_dag(state).await
}

pub async fn node_info(State(state): State<AppState>) -> ApiResult<Json<NodeInfoResponse>> {
    let info = state.node.get_info().await?;
    Ok(Json(info.into()))
}

pub async fn virtual_chain_blue_score(
    State(state): State<AppState>,
) -> ApiResult<Json<BlueScore>> {
    Ok(Json(state.node.get_sink_blue_score().await?))
}
