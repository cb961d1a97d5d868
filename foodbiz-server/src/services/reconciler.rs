//! Payment reconciler
//!
//! Applies a verified payment-completion event to the order it references.
//! Redelivery is expected; every outcome other than a database failure is
//! a success from the event sender's point of view.

use std::str::FromStr;

use shared::models::OrderStatus;

use crate::db::{Database, orders};

/// How a completion event treats orders already past payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaidTransitionPolicy {
    /// Only `PENDING` and `CONFIRMED` orders move to `PAID`
    #[default]
    RespectTerminal,
    /// Any existing order moves to `PAID`, including completed or cancelled ones
    Overwrite,
}

impl FromStr for PaidTransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "respect_terminal" => Ok(Self::RespectTerminal),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(format!(
                "unknown paid transition policy '{other}' (expected respect_terminal or overwrite)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Paid,
    AlreadyPaid,
    /// The order sits in a state the policy does not override
    TerminalPreserved(String),
    OrderNotFound,
}

pub async fn handle_payment_completed(
    db: &Database,
    policy: PaidTransitionPolicy,
    order_id: i64,
    payment_intent_id: Option<&str>,
) -> Result<ReconcileOutcome, sqlx::Error> {
    let outcome = match policy {
        PaidTransitionPolicy::RespectTerminal => {
            if orders::mark_paid_if_payable(db, order_id, payment_intent_id).await? > 0 {
                ReconcileOutcome::Paid
            } else {
                match orders::status_of(db, order_id).await? {
                    None => ReconcileOutcome::OrderNotFound,
                    Some(status) if is_paid(&status) => ReconcileOutcome::AlreadyPaid,
                    Some(status) => ReconcileOutcome::TerminalPreserved(status),
                }
            }
        }
        PaidTransitionPolicy::Overwrite => match orders::status_of(db, order_id).await? {
            None => ReconcileOutcome::OrderNotFound,
            Some(status) => {
                orders::mark_paid_unconditionally(db, order_id, payment_intent_id).await?;
                if is_paid(&status) {
                    ReconcileOutcome::AlreadyPaid
                } else {
                    ReconcileOutcome::Paid
                }
            }
        },
    };

    match &outcome {
        ReconcileOutcome::Paid => tracing::info!(order_id, "Order marked as PAID"),
        ReconcileOutcome::AlreadyPaid => {
            tracing::info!(order_id, "Duplicate payment completion ignored")
        }
        ReconcileOutcome::TerminalPreserved(status) => tracing::warn!(
            order_id,
            status = %status,
            "Payment completion for order in terminal state, status kept"
        ),
        ReconcileOutcome::OrderNotFound => {
            tracing::warn!(order_id, "Payment completion for unknown order ignored")
        }
    }
    Ok(outcome)
}

fn is_paid(status: &str) -> bool {
    OrderStatus::parse(status) == Some(OrderStatus::Paid)
}
