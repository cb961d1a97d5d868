//! Admin endpoints
//!
//! Everything except `auth::login` sits behind `admin_auth_middleware`.

pub mod auth;
pub mod items;
pub mod orders;
pub mod weeks;
