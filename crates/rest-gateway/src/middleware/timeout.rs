//! Timeout middleware.
//!
//! Requests returning hydrated transactions get the longer hydration timeout,
//! everything else the default one. An expired request is answered with 504
//! and the handler future is dropped, abandoning any in-flight query.

use crate::domain::config::TimeoutConfig;
use crate::domain::error::ApiError;
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tower::{Layer, Service};
use tracing::warn;

/// Path suffixes served with the hydration timeout.
const HYDRATION_SUFFIXES: [&str; 2] = ["/full-transactions", "/full-transactions-page"];

/// Applies the per-route deadline from [`TimeoutConfig`].
#[derive(Clone)]
pub struct TimeoutLayer {
    config: Arc<TimeoutConfig>,
}

impl TimeoutLayer {
    pub fn new(config: TimeoutConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

#[derive(Clone)]
pub struct TimeoutService<S> {
    inner: S,
    config: Arc<TimeoutConfig>,
}

impl<S> Service<Request<Body>> for TimeoutService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limit = timeout_for_path(req.uri().path(), &self.config);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match timeout(limit, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "Request timed out");
                    Ok(ApiError::timeout(limit.as_secs()).into_response())
                }
            }
        })
    }
}

fn timeout_for_path(path: &str, config: &TimeoutConfig) -> Duration {
    let path = path.trim_end_matches('/');
    if HYDRATION_SUFFIXES.iter().any(|suffix| path.ends_with(suffix)) {
        config.hydration
    } else {
        config.default
    }
}
