//! foodbiz-server: weekly menu ordering backend
//!
//! - Serves the published weekly menu and accepts pickup/delivery orders
//! - Opens Stripe checkout sessions and applies verified payment webhooks
//! - Admin API (JWT authenticated) for menus and order handling
//! - Keeps older SQLite/PostgreSQL schemas usable through an additive migrator

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod services;
pub mod state;
pub mod stripe;
