//! REST handlers, one module per URL namespace.
//!
//! Query strings are strict: unknown parameters are rejected with 400.

pub mod addresses;
pub mod info;
pub mod ping;
pub mod response;

use serde::Deserialize;

/// Query string of endpoints that take no parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}
