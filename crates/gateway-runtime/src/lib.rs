//! # Gateway Runtime Library
//!
//! Wiring for the gateway executable: configuration loading, logging setup
//! and construction of the concrete adapters. The entry point is the
//! `main.rs` binary.
//!
//! ## Adapters
//!
//! - **PostgreSQL** (`SQL_URI`): address mapping, activity, names and
//!   transaction details. Without it the database endpoints answer 503.
//! - **Node bridge** (`KASPAD_HOST_1`): balances, UTXOs and network info.
//! - **Fixed price** (`KAS_PRICE_USD`): market cap figures.

pub mod adapters;
pub mod config;
pub mod runtime;

pub use config::{RuntimeConfig, RuntimeConfigError};
pub use runtime::{build_service, init_tracing};
