//! Application state shared by every handler

use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::services::checkout::CheckoutUrls;
use crate::services::reconciler::PaidTransitionPolicy;
use crate::stripe::{PaymentGateway, StripeGateway};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// `None` when Stripe is not configured
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    pub stripe_webhook_secret: Option<String>,
    pub checkout_urls: CheckoutUrls,
    pub paid_policy: PaidTransitionPolicy,
    pub admin_password: Option<String>,
    pub jwt_secret: String,
    pub demo_mode: bool,
}

impl AppState {
    /// Build state around a bootstrapped database
    pub fn new(config: &Config, db: Database) -> Self {
        let gateway = config
            .stripe_secret_key
            .as_deref()
            .map(|key| Arc::new(StripeGateway::new(key)) as Arc<dyn PaymentGateway>);
        if gateway.is_none() {
            tracing::warn!("STRIPE_SECRET_KEY not set, checkout is disabled");
        }
        if config.stripe_webhook_secret.is_none() {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set, payment webhooks are rejected");
        }
        if config.admin_password.is_none() {
            tracing::warn!("ADMIN_PASSWORD not set, admin login is disabled");
        }

        Self {
            db,
            gateway,
            stripe_webhook_secret: config.stripe_webhook_secret.clone(),
            checkout_urls: config.checkout_urls.clone(),
            paid_policy: config.paid_policy,
            admin_password: config.admin_password.clone(),
            jwt_secret: config.jwt_secret.clone(),
            demo_mode: config.demo_mode,
        }
    }
}
