//! Stripe integration via REST API (no SDK dependency)

pub mod signature;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::orders::CheckoutLine;

pub use signature::{SignatureError, verify_webhook_signature};

const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Everything a provider needs to open a hosted checkout for one order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub order_id: i64,
    pub lines: Vec<CheckoutLine>,
    pub success_url: String,
    pub cancel_url: String,
}

/// A hosted checkout session opened by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("payment provider rejected the request: {0}")]
    Rejected(String),
}

/// Payment provider seam; the order id travels in the session metadata
/// and comes back on the completion webhook.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;
}

/// Stripe Checkout (one-time payment mode)
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
            api_base: STRIPE_API_BASE.to_string(),
        }
    }
}

/// Form fields for `POST /v1/checkout/sessions`.
///
/// Prices are USD minor units taken from the live menu item.
pub fn checkout_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[]".to_string(), "card".to_string()),
    ];
    for (i, line) in request.lines.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[price_data][currency]"), "usd".to_string()));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            line.name.clone(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            line.unit_amount_cents.to_string(),
        ));
        form.push((format!("{prefix}[quantity]"), line.qty.to_string()));
    }
    form.push(("metadata[order_id]".to_string(), request.order_id.to_string()));
    form.push(("success_url".to_string(), request.success_url.clone()));
    form.push(("cancel_url".to_string(), request.cancel_url.clone()));
    form
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&checkout_form(request))
            .send()
            .await?
            .json()
            .await?;

        match (resp["id"].as_str(), resp["url"].as_str()) {
            (Some(id), Some(url)) => Ok(CheckoutSession {
                id: id.to_string(),
                url: url.to_string(),
            }),
            _ => {
                let message = resp["error"]["message"]
                    .as_str()
                    .map(String::from)
                    .unwrap_or_else(|| resp.to_string());
                Err(GatewayError::Rejected(message))
            }
        }
    }
}
