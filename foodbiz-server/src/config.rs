//! Server configuration from environment variables

use crate::logger::LogSettings;
use crate::services::checkout::CheckoutUrls;
use crate::services::reconciler::PaidTransitionPolicy;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const MIN_PRODUCTION_JWT_SECRET_LEN: usize = 32;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// `sqlite://...` or `postgres://...` (env: DATABASE_URL, alias DB_URL)
    pub database_url: String,
    pub db_max_connections: u32,
    /// HTTP port (env: HTTP_PORT, alias PORT)
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Reported by /health
    pub demo_mode: bool,
    /// Admin login password; admin login answers 503 while unset
    pub admin_password: Option<String>,
    /// HS256 secret for admin tokens
    pub jwt_secret: String,
    /// CORS origins
    pub allowed_origins: Vec<String>,
    /// Drop all tables at startup (development only)
    pub reset_db_on_startup: bool,
    /// Seed a demo menu into an empty database
    pub seed_demo_data: bool,
    /// Checkout answers 503 while unset
    pub stripe_secret_key: Option<String>,
    /// Webhook answers 503 while unset
    pub stripe_webhook_secret: Option<String>,
    pub checkout_urls: CheckoutUrls,
    pub paid_policy: PaidTransitionPolicy,
    pub log: LogSettings,
}

fn parse_flag(raw: Option<String>) -> bool {
    raw.map(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
    .unwrap_or(false)
}

fn parse_origins(raw: Option<String>) -> Vec<String> {
    let origins: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();
    if origins.is_empty() {
        vec![
            "http://localhost:3000".to_string(),
            "http://localhost:3001".to_string(),
        ]
    } else {
        origins
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT").unwrap_or_else(|| "development".into());
        let is_production = environment == "production";

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) if is_production && secret.len() < MIN_PRODUCTION_JWT_SECRET_LEN => {
                return Err(format!(
                    "JWT_SECRET must be at least {MIN_PRODUCTION_JWT_SECRET_LEN} characters in production"
                )
                .into());
            }
            Some(secret) => secret,
            None if is_production => return Err("JWT_SECRET must be set in production".into()),
            None => "dev-JWT_SECRET-not-for-production".into(),
        };

        let paid_policy = match var("PAYMENT_PAID_POLICY") {
            Some(raw) => raw.parse::<PaidTransitionPolicy>()?,
            None => PaidTransitionPolicy::default(),
        };

        let http_port = match var("HTTP_PORT").or_else(|| var("PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| format!("invalid HTTP port: {raw}"))?,
            None => 8000,
        };

        Ok(Self {
            database_url: var("DATABASE_URL")
                .or_else(|| var("DB_URL"))
                .unwrap_or_else(|| "sqlite://foodbiz.db?mode=rwc".into()),
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(5),
            http_port,
            demo_mode: var("DEMO_MODE").is_none_or(|v| parse_flag(Some(v))),
            admin_password: var("ADMIN_PASSWORD"),
            jwt_secret,
            allowed_origins: parse_origins(var("ALLOWED_ORIGINS")),
            reset_db_on_startup: parse_flag(var("RESET_DB_ON_STARTUP")),
            seed_demo_data: parse_flag(var("SEED_DEMO_DATA")),
            stripe_secret_key: var("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: var("STRIPE_WEBHOOK_SECRET"),
            checkout_urls: CheckoutUrls {
                success_url: var("STRIPE_SUCCESS_URL").unwrap_or_else(|| {
                    "http://localhost:3000/order/success?session_id={CHECKOUT_SESSION_ID}".into()
                }),
                cancel_url: var("STRIPE_CANCEL_URL")
                    .unwrap_or_else(|| "http://localhost:3000/order/cancel".into()),
            },
            paid_policy,
            log: LogSettings {
                json: var("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
                log_dir: var("LOG_DIR"),
            },
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
