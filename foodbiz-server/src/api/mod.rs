//! HTTP routes

pub mod admin;
pub mod health;
pub mod public;
pub mod stripe_webhook;

use axum::routing::{get, patch, post};
use axum::{Router, middleware};
use http::{HeaderValue, Method, header};
use shared::error::{AppError, ErrorCode};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::admin_auth_middleware;
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

/// Log a repository failure and hide it behind a generic 500
pub(crate) fn internal(e: impl std::fmt::Display) -> AppError {
    tracing::error!("Database error: {e}");
    AppError::new(ErrorCode::InternalError)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Create the combined router
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    // Customer-facing (no auth)
    let public_routes = Router::new()
        .route("/api/public/menu", get(public::menu::current_menu))
        .route("/api/public/orders", post(public::orders::create_order))
        .route(
            "/api/public/checkout/session",
            post(public::checkout::create_session),
        );

    // Stripe webhook (signature-verified, raw body)
    let webhook_routes = Router::new().route(
        "/api/public/stripe/webhook",
        post(stripe_webhook::handle_webhook),
    );

    // Admin (bearer token with admin role)
    let admin_routes = Router::new()
        .route(
            "/api/admin/menu-weeks",
            get(admin::weeks::list_weeks).post(admin::weeks::create_week),
        )
        .route("/api/admin/menu-weeks/{id}", patch(admin::weeks::update_week))
        .route(
            "/api/admin/menu-weeks/{id}/items",
            get(admin::weeks::list_week_items),
        )
        .route(
            "/api/admin/menu-items",
            get(admin::items::list_items).post(admin::items::create_item),
        )
        .route("/api/admin/menu-items/{id}", patch(admin::items::update_item))
        .route("/api/admin/orders", get(admin::orders::list_orders))
        .route("/api/admin/orders/tally", get(admin::orders::tally))
        .route(
            "/api/admin/orders/{id}/status",
            patch(admin::orders::update_status),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    let admin_login = Router::new().route("/api/admin/auth/login", post(admin::auth::login));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(public_routes)
        .merge(webhook_routes)
        .merge(admin_login)
        .merge(admin_routes)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
