//! Router assembly and shared handler state.

use crate::domain::config::GatewayConfig;
use crate::domain::error::{ApiError, ApiResult};
use crate::middleware::{create_cors_layer, TimeoutLayer, TracingLayer};
use crate::ports::{IndexBackend, NodeClient, PriceSource, SystemTimeSource, TimeSource};
use crate::rest::{addresses, info, ping};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::{predicate::SizeAbove, CompressionLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// `None` when no database is configured.
    pub index: Option<Arc<dyn IndexBackend>>,
    pub node: Arc<dyn NodeClient>,
    pub price: Arc<dyn PriceSource>,
    pub clock: Arc<dyn TimeSource>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        node: Arc<dyn NodeClient>,
        price: Arc<dyn PriceSource>,
    ) -> Self {
        Self {
            index: None,
            node,
            price,
            clock: Arc::new(SystemTimeSource),
            config: Arc::new(config),
        }
    }

    pub fn with_index(mut self, index: Arc<dyn IndexBackend>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// The database backend, or 503 for database-only endpoints.
    pub fn index(&self) -> ApiResult<&dyn IndexBackend> {
        self.index.as_deref().ok_or_else(ApiError::database_required)
    }
}

/// Build the HTTP router with the full middleware stack.
///
/// Layers are added innermost first, so requests pass
/// Tracing → CORS → Compression → Timeout → Body limit → handler.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    Router::new()
        .route("/addresses/active", post(addresses::addresses_active))
        .route("/addresses/balances", post(addresses::balances))
        .route("/addresses/:address/balance", get(addresses::balance))
        .route("/addresses/:address/utxos", get(addresses::utxos))
        .route(
            "/addresses/:address/full-transactions",
            get(addresses::full_transactions),
        )
        .route(
            "/addresses/:address/full-transactions-page",
            get(addresses::full_transactions_page),
        )
        .route(
            "/addresses/:address/transactions-count",
            get(addresses::transactions_count),
        )
        .route("/addresses/:address/name", get(addresses::name))
        .route("/info/coinsupply", get(info::coin_supply))
        .route("/info/coinsupply/circulating", get(info::circulating_coins))
        .route("/info/coinsupply/total", get(info::total_coins))
        .route("/info/marketcap", get(info::market_cap))
        .route("/info/fee-estimate", get(info::fee_estimate))
        .route("/info/blockdag", get(info::block_dag))
        .route("/info/network", get(info::network))
        .route("/info/kaspad", get(info::node_info))
        .route(
            "/info/virtual-chain-blue-score",
            get(info::virtual_chain_blue_score),
        )
        .route("/ping", get(ping::ping))
        .layer(DefaultBodyLimit::max(config.limits.max_upload_size))
        .layer(TimeoutLayer::new(config.timeouts.clone()))
        .layer(
            CompressionLayer::new()
                .gzip(true)
                .compress_when(SizeAbove::new(config.limits.gzip_min_size)),
        )
        .layer(create_cors_layer(&config.cors))
        .layer(TracingLayer::new())
        .with_state(state)
}
