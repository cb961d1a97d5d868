//! Shared types for the foodbiz service
//!
//! Wire models for menus and orders, the unified error system,
//! and small time helpers used by the server and its tests.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};
