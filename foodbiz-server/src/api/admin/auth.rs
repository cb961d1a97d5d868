//! Admin login

use axum::{Json, extract::State};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shared::error::{AppError, ErrorCode};

use crate::api::ApiResult;
use crate::auth::admin_auth;
use crate::state::AppState;

/// POST /api/admin/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// Compare passwords in constant time by MACing both under `key`.
fn password_matches(supplied: &str, expected: &str, key: &[u8]) -> bool {
    let Ok(keyed) = Hmac::<Sha256>::new_from_slice(key) else {
        return false;
    };
    let mut mac = keyed.clone();
    mac.update(expected.as_bytes());
    let expected_tag = mac.finalize().into_bytes();

    let mut mac = keyed;
    mac.update(supplied.as_bytes());
    mac.verify_slice(&expected_tag).is_ok()
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let expected = state
        .admin_password
        .as_deref()
        .ok_or_else(|| AppError::new(ErrorCode::AdminAuthNotConfigured))?;

    if !password_matches(&req.password, expected, state.jwt_secret.as_bytes()) {
        tracing::warn!("Admin login rejected");
        return Err(AppError::invalid_credentials());
    }

    let access_token = admin_auth::create_token(&state.jwt_secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    tracing::info!("Admin logged in");
    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
    }))
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use super::password_matches;
    use crate::api::test_support::{ADMIN_PASSWORD, send, test_state};
    use crate::auth::admin_auth::create_token_with_role;

    const LOGIN: &str = "/api/admin/auth/login";

    #[tokio::test]
    async fn login_issues_usable_token() {
        let (state, _) = test_state().await;
        let (status, body) = send(
            &state,
            "POST",
            LOGIN,
            None,
            Some(json!({"password": ADMIN_PASSWORD})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");

        let token = body["access_token"].as_str().unwrap();
        let (status, _) = send(&state, "GET", "/api/admin/orders", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let (state, _) = test_state().await;
        let (status, body) = send(
            &state,
            "POST",
            LOGIN,
            None,
            Some(json!({"password": "guess"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 1002);
    }

    #[test]
    fn password_comparison() {
        let key = b"jwt-secret";
        assert!(password_matches("hunter2", "hunter2", key));
        assert!(!password_matches("hunter", "hunter2", key));
        assert!(!password_matches("hunter22", "hunter2", key));
        assert!(!password_matches("", "hunter2", key));
        assert!(password_matches("", "", key));
    }

    #[tokio::test]
    async fn unset_password_is_503() {
        let (mut state, _) = test_state().await;
        state.admin_password = None;
        let (status, body) = send(
            &state,
            "POST",
            LOGIN,
            None,
            Some(json!({"password": ADMIN_PASSWORD})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], 1008);
    }

    #[tokio::test]
    async fn admin_routes_require_admin_token() {
        let (state, _) = test_state().await;

        let (status, body) = send(&state, "GET", "/api/admin/menu-weeks", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 1001);

        let (status, _) =
            send(&state, "GET", "/api/admin/menu-weeks", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let viewer = create_token_with_role("viewer", &state.jwt_secret).unwrap();
        let (status, body) =
            send(&state, "GET", "/api/admin/menu-weeks", Some(&viewer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], 2003);
    }
}
