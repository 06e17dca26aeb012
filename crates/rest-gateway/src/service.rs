//! Gateway service - owns the HTTP server lifecycle.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::ports::{IndexBackend, NodeClient, PriceSource};
use crate::router::{build_router, AppState};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// REST gateway service state
pub struct ApiGatewayService {
    config: GatewayConfig,
    state: AppState,
}

impl ApiGatewayService {
    /// Create a new gateway service. Without `index`, database-backed
    /// endpoints answer 503.
    pub fn new(
        config: GatewayConfig,
        index: Option<Arc<dyn IndexBackend>>,
        node: Arc<dyn NodeClient>,
        price: Arc<dyn PriceSource>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        if index.is_none() {
            warn!("No database configured; database endpoints will answer 503");
        }

        let mut state = AppState::new(config.clone(), node, price);
        if let Some(index) = index {
            state = state.with_index(index);
        }

        Ok(Self { config, state })
    }

    /// Router with the full middleware stack, for serving or testing.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind the configured address and serve until `shutdown` completes.
    pub async fn start<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` completes.
    /// In-flight requests are allowed to finish.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr: Option<SocketAddr> = listener.local_addr().ok();
        info!(addr = ?local_addr, "Starting HTTP server");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("Received shutdown signal");
            })
            .await
            .map_err(|e| GatewayError::Serve(e.to_string()))?;

        info!("Gateway stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::UpstreamError;
    use crate::domain::network::{
        BalanceEntry, BlockDagInfo, BlueScore, CoinSupply, FeeEstimate, NodeInfo, Utxo,
    };
    use crate::domain::Address;
    use async_trait::async_trait;

    struct OfflineNode;

    #[async_trait]
    impl NodeClient for OfflineNode {
        async fn get_balance(&self, _: &Address) -> Result<u64, UpstreamError> {
            Err(offline())
        }
        async fn get_balances(&self, _: &[Address]) -> Result<Vec<BalanceEntry>, UpstreamError> {
            Err(offline())
        }
        async fn get_utxos(&self, _: &[Address]) -> Result<Vec<Utxo>, UpstreamError> {
            Err(offline())
        }
        async fn get_coin_supply(&self) -> Result<CoinSupply, UpstreamError> {
            Err(offline())
        }
        async fn get_fee_estimate(&self) -> Result<Option<FeeEstimate>, UpstreamError> {
            Err(offline())
        }
        async fn get_block_dag_info(&self) -> Result<BlockDagInfo, UpstreamError> {
            Err(offline())
        }
        async fn get_info(&self) -> Result<NodeInfo, UpstreamError> {
            Err(offline())
        }
        async fn get_sink_blue_score(&self) -> Result<BlueScore, UpstreamError> {
            Err(offline())
        }
    }

    struct NoPrice;

    #[async_trait]
    impl PriceSource for NoPrice {
        async fn usd_price(&self) -> Result<f64, UpstreamError> {
            Ok(0.0)
        }
    }

    fn offline() -> UpstreamError {
        UpstreamError::Unavailable("node offline".into())
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GatewayConfig::default();
        config.limits.max_upload_size = 0;
        let result =
            ApiGatewayService::new(config, None, Arc::new(OfflineNode), Arc::new(NoPrice));
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let service = ApiGatewayService::new(
            GatewayConfig::default(),
            None,
            Arc::new(OfflineNode),
            Arc::new(NoPrice),
        )
        .unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(service.serve(listener, async move {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
