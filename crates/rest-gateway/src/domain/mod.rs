//! Domain types and operations for the gateway.
//!
//! Everything here talks to the outside world through `crate::ports` only.

pub mod activity;
pub mod address;
pub mod assembler;
pub mod config;
pub mod error;
pub mod network;
pub mod paging;
pub mod types;

// Re-exports for convenience
pub use activity::check_active;
pub use address::{Address, AddressError};
pub use assembler::{resolve_previous_outpoints, FieldMask, ResponseAssembler};
pub use config::{ConfigError, GatewayConfig};
pub use error::{ApiError, ApiResult, ErrorKind, GatewayError, QueryError, UpstreamError};
pub use paging::AddressHistory;
pub use types::*;
