//! Business logic on top of the repositories

pub mod checkout;
pub mod ledger;
pub mod reconciler;
