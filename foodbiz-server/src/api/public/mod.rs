//! Customer-facing endpoints (no auth)

pub mod checkout;
pub mod menu;
pub mod orders;
