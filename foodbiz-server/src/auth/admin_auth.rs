//! Admin JWT authentication

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

pub const ADMIN_ROLE: &str = "admin";

const JWT_EXPIRY_HOURS: i64 = 12;

/// JWT claims for admin sessions
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub role: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Verified admin identity, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub subject: String,
}

/// Issue an admin token valid for 12 hours.
pub fn create_token(secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    create_token_with_role(ADMIN_ROLE, secret)
}

pub(crate) fn create_token_with_role(
    role: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = AdminClaims {
        sub: ADMIN_ROLE.to_string(),
        role: role.to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode a bearer token and require the admin role.
pub fn verify_token(token: &str, secret: &str) -> Result<AdminIdentity, AppError> {
    let token_data = jsonwebtoken::decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::token_expired(),
            _ => AppError::new(ErrorCode::TokenInvalid),
        }
    })?;

    if token_data.claims.role != ADMIN_ROLE {
        return Err(AppError::new(ErrorCode::AdminRequired));
    }
    Ok(AdminIdentity {
        subject: token_data.claims.sub,
    })
}

/// Middleware guarding every admin route except login
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::not_authenticated().into_response())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format").into_response())?;

    let identity =
        verify_token(token, &state.jwt_secret).map_err(IntoResponse::into_response)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_token_verifies() {
        let token = create_token(SECRET).unwrap();
        let identity = verify_token(&token, SECRET).unwrap();
        assert_eq!(identity.subject, "admin");
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = create_token(SECRET).unwrap();
        let err = verify_token(&token, "another-secret-another-secret-xx").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn non_admin_role_is_forbidden() {
        let token = create_token_with_role("viewer", SECRET).unwrap();
        let err = verify_token(&token, SECRET).unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
        assert_eq!(err.http_status(), http::StatusCode::FORBIDDEN);
    }
}
