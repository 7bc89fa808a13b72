//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.
//!
//! A request moves through `Unauthenticated -> TokenPresent -> TokenValid ->
//! SessionFound -> Authenticated` and is rejected at the first failed step.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
    Extension,
};
use coursehub_core::domain::ADMIN_ROLE;
use coursehub_core::User;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::TokenKind;
use crate::error::ApiError;
use crate::web::auth::{start_session, token_cookies};
use crate::web::cookies::{get_cookie, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::web::state::{AppState, AuthUser};

/// The access token comes from the `access_token` cookie, or from an
/// `Authorization: Bearer` header for non-browser clients.
fn access_token(headers: &HeaderMap) -> Option<&str> {
    get_cookie(headers, ACCESS_COOKIE).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}

/// Middleware that validates the access token and resolves the session.
///
/// If valid, inserts an [`AuthUser`] into request extensions for handlers to use.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Token present?
    let token = access_token(req.headers()).ok_or(ApiError::Unauthenticated)?;

    // 2. Signature and expiry valid?
    let claims = state
        .tokens
        .verify(token, TokenKind::Access)
        .map_err(|e| {
            debug!("Rejected access token: {}", e);
            ApiError::InvalidToken
        })?;

    // 3. Session still cached?
    let user = state
        .sessions
        .get_session(claims.id)
        .await?
        .ok_or(ApiError::SessionExpired)?;

    // 4. Attach the identity and continue to the handler
    req.extensions_mut().insert(AuthUser(user));
    Ok(next.run(req).await)
}

/// Fails with `Forbidden` unless the user's role is one of `roles`.
pub fn authorize_roles(user: &User, roles: &[&str]) -> Result<(), ApiError> {
    if user.has_any_role(roles) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Role {} is not allowed to access this resource",
            user.role
        )))
    }
}

/// Route layer for admin-only endpoints. Must run after [`require_auth`].
pub async fn require_admin(
    Extension(AuthUser(user)): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize_roles(&user, &[ADMIN_ROLE])?;
    Ok(next.run(req).await)
}

/// Rotates the session from the refresh token.
///
/// Verifies the refresh cookie, requires the session to still exist, issues a new
/// access token and a new refresh token, and makes both the identity and the new
/// tokens available to the downstream handler. The new cookies are appended to
/// whatever response the handler produces.
pub async fn update_access_token(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let refresh_token =
        get_cookie(req.headers(), REFRESH_COOKIE).ok_or(ApiError::InvalidRefreshToken)?;

    let claims = state
        .tokens
        .verify(refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            debug!("Rejected refresh token: {}", e);
            ApiError::InvalidRefreshToken
        })?;

    let user = state
        .sessions
        .get_session(claims.id)
        .await?
        .ok_or(ApiError::SessionExpired)?;

    let issued = start_session(&state, &user).await?;
    info!("Rotated session tokens for user {}", user.id);

    let cookies = token_cookies(&state, &issued);
    req.extensions_mut().insert(AuthUser(user));
    req.extensions_mut().insert(issued);

    let mut response = next.run(req).await;
    for (name, cookie) in cookies {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::Internal(format!("invalid cookie header: {e}")))?;
        response.headers_mut().append(name, value);
    }
    Ok(response)
}
