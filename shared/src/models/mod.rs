//! Data models
//!
//! Shared between the server and its HTTP clients.
//! All IDs are `i64`; money is integer cents; timestamps are UTC without offset.

pub mod customer;
pub mod menu;
pub mod order;

// Re-exports
pub use customer::*;
pub use menu::*;
pub use order::*;
