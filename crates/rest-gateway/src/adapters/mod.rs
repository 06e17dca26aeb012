//! Adapters for the gateway ports.
//!
//! Only the in-memory backend lives here; database and node adapters belong
//! to the runtime crate.

pub mod memory;

pub use memory::InMemoryIndex;
