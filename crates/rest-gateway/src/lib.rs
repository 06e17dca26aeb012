//! REST gateway over a node RPC interface and an indexer database.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        REST GATEWAY                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Middleware: Tracing → CORS → Gzip → Timeout → Body limit     │
//! │                              │                               │
//! │  rest::{addresses, info, ping}                               │
//! │        │                 │                     │             │
//! │  AddressHistory   check_active   ResponseAssembler           │
//! │  (cursor/offset)  (anti-join)    (hydrate + mask)            │
//! │        │                 │                     │             │
//! │  ports: AddressTransactionStore, ActivityIndex,              │
//! │         TransactionSearch, AddressNameStore, NodeClient      │
//! └──────────────────────────────────────────────────────────────┘
//!          │                                  │
//!     index database                     node RPC bridge
//! ```
//!
//! # Paging
//!
//! `/addresses/{address}/full-transactions-page` pages by block time. Feed
//! the `X-Oldest-Epoch-Millis` header back as `before` until an empty page
//! comes back. Transactions sharing the boundary block time are never split
//! across pages.
//!
//! # Usage
//!
//! ```ignore
//! use rest_gateway::{ApiGatewayService, GatewayConfig};
//!
//! let service = ApiGatewayService::new(config, Some(index), node, price)?;
//! service.start(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod ports;
pub mod rest;
pub mod router;
pub mod service;

// Re-exports for public API
pub use domain::config::GatewayConfig;
pub use domain::error::{ApiError, ApiResult, GatewayError, QueryError, UpstreamError};
pub use domain::types::*;
pub use router::{build_router, AppState};
pub use service::ApiGatewayService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
