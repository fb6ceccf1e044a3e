//! Bearer token authentication middleware

use crate::{
    auth::jwt::{Claims, JwtService},
    error::AppError,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Verified token claims attached to request extensions
///
/// `token_is_superadmin` is whatever the token said at issuance. Privileged
/// handlers must still consult the live user record.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub email: String,
    pub token_is_superadmin: bool,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            email: claims.sub,
            token_is_superadmin: claims.is_superadmin,
        }
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| {
            let (scheme, token) = s.split_once(' ')?;
            let token = token.trim();
            (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty())
                .then(|| token.to_string())
        })
        .ok_or(AppError::InvalidToken)
}

/// Bearer authentication - token required
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers()).map_err(|e| {
        tracing::warn!(uri = %req.uri(), "Rejected request without bearer token");
        e
    })?;

    let claims = jwt_service.verify_token(&token).map_err(|e| {
        tracing::warn!(uri = %req.uri(), reason = %e, "Rejected bearer token");
        AppError::from(e)
    })?;

    req.extensions_mut().insert(AuthContext::from(claims));

    Ok(next.run(req).await)
}
