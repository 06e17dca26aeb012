//! Concrete adapters for the gateway ports.
//!
//! - `postgres` / `search` - index database over a sqlx pool
//! - `node_rpc` - node HTTP bridge over reqwest
//! - `price` - configured coin price

pub mod node_rpc;
pub mod postgres;
pub mod price;
pub mod search;

pub use node_rpc::NodeRpcClient;
pub use postgres::PgIndex;
pub use price::FixedPrice;
