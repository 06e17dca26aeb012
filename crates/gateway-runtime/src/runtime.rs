//! Process setup shared by the binary and the tests.

use crate::adapters::{FixedPrice, NodeRpcClient, PgIndex};
use crate::config::RuntimeConfig;
use anyhow::{Context, Result};
use rest_gateway::ports::IndexBackend;
use rest_gateway::ApiGatewayService;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global subscriber. `RUST_LOG` wins over `debug`.
pub fn init_tracing(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;
    Ok(())
}

/// Connect the adapters described by `config` and build the service.
pub async fn build_service(config: &RuntimeConfig) -> Result<ApiGatewayService> {
    let index: Option<Arc<dyn IndexBackend>> = match &config.database.url {
        Some(url) => {
            let pg = PgIndex::connect(url, &config.database)
                .await
                .context("failed to connect to the index database")?;
            Some(Arc::new(pg))
        }
        None => None,
    };

    let node = NodeRpcClient::new(config.node.url.clone(), config.node.request_timeout)
        .context("failed to create node client")?;
    info!(node = %config.node.url, "Node bridge configured");

    let service = ApiGatewayService::new(
        config.gateway.clone(),
        index,
        Arc::new(node),
        Arc::new(FixedPrice::new(config.market.price_usd)),
    )?;
    Ok(service)
}
