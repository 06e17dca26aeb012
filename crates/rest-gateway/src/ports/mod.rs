//! # Ports Layer
//!
//! Driven ports (outbound SPI) implemented by storage, node and price
//! adapters. Handlers only ever see these traits.

pub mod outbound;

pub use outbound::*;
