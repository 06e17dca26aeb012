//! Middleware stack for the gateway.
//!
//! Layer order (outermost first): Tracing → CORS → Compression → Timeout →
//! Body limit → Handler. See `crate::router::build_router`.

pub mod cors;
pub mod timeout;
pub mod tracing;

pub use cors::create_cors_layer;
pub use timeout::TimeoutLayer;
pub use tracing::TracingLayer;
