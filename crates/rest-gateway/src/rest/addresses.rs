//! `/addresses/...` handlers.

use crate::domain::activity::check_active;
use crate::domain::address::Address;
use crate::domain::assembler::{FieldMask, ResponseAssembler};
use crate::domain::error::{ApiError, ApiResult};
use crate::domain::network::{BalanceEntry, Utxo};
use crate::domain::paging::AddressHistory;
use crate::domain::types::{
    AddressActivity, AddressName, EpochMillis, PageLimit, ResolveDepth, TransactionCount,
    TransactionRecord,
};
use crate::rest::response::cache_control;
use crate::rest::NoParams;
use crate::router::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::debug;

/// Number of distinct transactions in a cursor page.
pub const CURRENT_PAGE_HEADER: HeaderName = HeaderName::from_static("x-current-page");
/// `before` value for the next cursor page.
pub const OLDEST_EPOCH_MILLIS_HEADER: HeaderName =
    HeaderName::from_static("x-oldest-epoch-millis");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FullTransactionsQuery {
    #[serde(default)]
    pub limit: PageLimit,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub fields: String,
    #[serde(default)]
    pub resolve_previous_outpoints: ResolveDepth,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FullTransactionsPageQuery {
    #[serde(default)]
    pub limit: PageLimit,
    /// Epoch millis; `0` means now.
    #[serde(default)]
    pub before: EpochMillis,
    #[serde(default)]
    pub fields: String,
    #[serde(default)]
    pub resolve_previous_outpoints: ResolveDepth,
}

/// Body of the batch address endpoints.
#[derive(Debug, Deserialize)]
pub struct AddressesRequest {
    pub addresses: Vec<String>,
}

fn parse_address(raw: &str) -> ApiResult<Address> {
    Ok(Address::parse(raw)?)
}

fn parse_mask(fields: &str) -> ApiResult<FieldMask> {
    FieldMask::parse(fields).map_err(ApiError::validation)
}

/// Offset-paged transactions of an address, fully hydrated.
pub async fn full_transactions(
    State(state): State<AppState>,
    Path(address): Path<String>,
    query: Result<Query<FullTransactionsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TransactionRecord>>> {
    let address = parse_address(&address)?;
    let Query(query) = query?;
    let mask = parse_mask(&query.fields)?;
    let index = state.index()?;

    let ids = AddressHistory::new(index.mapping(), state.clock.as_ref())
        .offset_page(&address, query.limit, query.offset)
        .await?;

    let records = ResponseAssembler::new(index.transactions())
        .hydrate(&ids, &mask, query.resolve_previous_outpoints)
        .await?;
    Ok(Json(records))
}

/// Cursor-paged transactions of an address, fully hydrated.
///
/// Repeat with `before` set to the returned `X-Oldest-Epoch-Millis` until an
/// empty list comes back. A page may hold more than `limit` transactions when
/// several share the oldest block time.
pub async fn full_transactions_page(
    State(state): State<AppState>,
    Path(address): Path<String>,
    query: Result<Query<FullTransactionsPageQuery>, QueryRejection>,
) -> ApiResult<(HeaderMap, Json<Vec<TransactionRecord>>)> {
    let address = parse_address(&address)?;
    let Query(query) = query?;
    if query.before < 0 {
        return Err(ApiError::validation(format!(
            "before must be greater than or equal to 0, got {}",
            query.before
        )));
    }
    let mask = parse_mask(&query.fields)?;
    let index = state.index()?;

    let page = AddressHistory::new(index.mapping(), state.clock.as_ref())
        .cursor_page(&address, query.limit, Some(query.before))
        .await?;

    let mut headers = HeaderMap::new();
    headers.insert(CURRENT_PAGE_HEADER, HeaderValue::from(page.count()));
    if let Some(oldest) = page.oldest_block_time {
        headers.insert(OLDEST_EPOCH_MILLIS_HEADER, HeaderValue::from(oldest));
    }

    let records = ResponseAssembler::new(index.transactions())
        .hydrate(&page.transaction_ids, &mask, query.resolve_previous_outpoints)
        .await?;
    Ok((headers, Json(records)))
}

/// Which addresses have ever transacted, in request order.
pub async fn addresses_active(
    State(state): State<AppState>,
    body: Result<Json<AddressesRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<AddressActivity>>> {
    let Json(body) = body?;
    let max = state.config.limits.max_batch_addresses;
    if body.addresses.len() > max {
        return Err(ApiError::validation(format!(
            "at most {} addresses per request, got {}",
            max,
            body.addresses.len()
        )));
    }
    let index = state.index()?;

    Ok(Json(check_active(index.activity(), &body.addresses).await?))
}

pub async fn transactions_count(
    State(state): State<AppState>,
    Path(address): Path<String>,
    params: Result<Query<NoParams>, QueryRejection>,
) -> ApiResult<Json<TransactionCount>> {
    let address = parse_address(&address)?;
    params?;
    let index = state.index()?;

    let total = AddressHistory::new(index.mapping(), state.clock.as_ref())
        .count(&address)
        .await?;
    Ok(Json(TransactionCount { total }))
}

/// Known name of an address. Both outcomes are cacheable.
pub async fn name(
    State(state): State<AppState>,
    Path(address): Path<String>,
    params: Result<Query<NoParams>, QueryRejection>,
) -> ApiResult<Response> {
    let address = parse_address(&address)?;
    params?;
    let index = state.index()?;
    let max_age = state.config.cache.name_not_found_max_age;

    match index.names().name_of(&address).await? {
        Some(name) => {
            let body = AddressName {
                address: address.to_string(),
                name,
            };
            Ok(([(header::CACHE_CONTROL, cache_control(max_age))], Json(body)).into_response())
        }
        None => {
            debug!(address = %address, "no name recorded");
            Err(ApiError::not_found("Address name not found").cacheable_for(max_age))
        }
    }
}

/// Balance from the node; zero for an address without UTXOs.
pub async fn balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<BalanceEntry>> {
    let address = parse_address(&address)?;
    let balance = state.node.get_balance(&address).await?;
    Ok(Json(BalanceEntry {
        address: address.to_string(),
        balance,
    }))
}

pub async fn balances(
    State(state): State<AppState>,
    body: Result<Json<AddressesRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<BalanceEntry>>> {
    let Json(body) = body?;
    let addresses = body
        .addresses
        .iter()
        .map(|raw| parse_address(raw))
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(state.node.get_balances(&addresses).await?))
}

/// Unspent outputs owned by the address.
pub async fn utxos(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<Vec<Utxo>>> {
    let address = parse_address(&address)?;
    let entries = state
        .node
        .get_utxos(std::slice::from_ref(&address))
        .await?;

    Ok(Json(
        entries
            .into_iter()
            .filter(|utxo| utxo.address == address.as_str())
            .collect(),
    ))
}
