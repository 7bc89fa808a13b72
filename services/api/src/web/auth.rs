//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: registration with email activation, login, social
//! login, logout and token refresh.

use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Extension, Json,
};
use coursehub_core::ports::{EmailMessage, EmailTemplate, PortError};
use coursehub_core::{ImageRef, NewUser, User};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, OnceLock};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::auth::CandidateUser;
use crate::error::ApiError;
use crate::web::cookies::{expired_cookie, session_cookie, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::web::state::{AppState, AuthUser, IssuedTokens};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ActivateRequest {
    pub activation_token: String,
    pub activation_code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SocialAuthRequest {
    pub email: String,
    pub name: String,
    /// URL of the avatar supplied by the identity provider.
    pub avatar: Option<String>,
}

//=========================================================================================
// Validation and session helpers
//=========================================================================================

pub(crate) fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"))
        .is_match(email)
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Please enter your name".to_string()));
    }
    if !is_valid_email(&req.email) {
        return Err(ApiError::Validation("Please enter a valid email".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Issues both tokens and creates (or replaces) the session of `user`.
pub(crate) async fn start_session(state: &AppState, user: &User) -> Result<IssuedTokens, ApiError> {
    let access_token = state.tokens.issue_access_token(user.id)?;
    let refresh_token = state.tokens.issue_refresh_token(user.id)?;
    state.sessions.create_session(user).await?;
    Ok(IssuedTokens {
        access_token,
        refresh_token,
    })
}

pub(crate) fn token_cookies(state: &AppState, issued: &IssuedTokens) -> [(HeaderName, String); 2] {
    let secure = state.config.production;
    [
        (
            header::SET_COOKIE,
            session_cookie(
                ACCESS_COOKIE,
                &issued.access_token,
                state.tokens.access_ttl().as_secs(),
                secure,
            ),
        ),
        (
            header::SET_COOKIE,
            session_cookie(
                REFRESH_COOKIE,
                &issued.refresh_token,
                state.tokens.refresh_ttl().as_secs(),
                secure,
            ),
        ),
    ]
}

/// Opens a session for `user` and answers with the token cookies, the user and
/// the access token.
async fn send_token(state: &AppState, user: User, status: StatusCode) -> Result<Response, ApiError> {
    let issued = start_session(state, &user).await?;
    let cookies = token_cookies(state, &issued);
    Ok((
        status,
        AppendHeaders(cookies),
        Json(json!({
            "success": true,
            "user": user,
            "accessToken": issued.access_token,
        })),
    )
        .into_response())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /register - Start a registration and email the activation code
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Activation email sent; body carries the activation token"),
        (status = 400, description = "Invalid input, duplicate email, or mail failure")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_registration(&req)?;

    if state.users.email_exists(&req.email).await? {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let candidate = CandidateUser {
        name: req.name.trim().to_string(),
        email: req.email.clone(),
        password: req.password,
    };
    let activation = state.tokens.issue_activation_token(candidate.clone())?;

    state
        .mailer
        .send_email(&EmailMessage {
            to: candidate.email.clone(),
            subject: "Activate your account".to_string(),
            template: EmailTemplate::Activation {
                name: candidate.name.clone(),
                activation_code: activation.activation_code.clone(),
            },
        })
        .await
        .map_err(|e| {
            error!("Failed to send activation email: {:?}", e);
            ApiError::upstream(StatusCode::BAD_REQUEST, e)
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("Please check your email {} to activate your account!", candidate.email),
            "activationToken": activation.token,
        })),
    ))
}

/// POST /activate - Confirm the email address and create the account
#[utoipa::path(
    post,
    path = "/activate",
    request_body = ActivateRequest,
    responses(
        (status = 201, description = "Account created and session opened"),
        (status = 400, description = "Invalid or expired token, wrong code, or duplicate email")
    )
)]
pub async fn activate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActivateRequest>,
) -> Result<Response, ApiError> {
    let candidate = state
        .tokens
        .verify_activation_token(&req.activation_token, &req.activation_code)?;

    if state.users.email_exists(&candidate.email).await? {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let hashed_password = hash_password(&candidate.password)?;
    let user = state
        .users
        .create_user(NewUser {
            name: candidate.name,
            email: candidate.email,
            hashed_password: Some(hashed_password),
            avatar: None,
            is_verified: true,
        })
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => ApiError::Conflict("Email already exists".to_string()),
            other => other.into(),
        })?;
    info!("Activated new user {}", user.id);

    send_token(&state, user, StatusCode::CREATED).await
}

/// POST /login - Login with email and password
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; cookies set"),
        (status = 400, description = "Missing fields or invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Please enter email and password".to_string(),
        ));
    }

    // 1. Get user by email
    let creds = match state.users.get_user_by_email(&req.email).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(ApiError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    // 2. Verify password (social accounts have none)
    let hash = creds
        .hashed_password
        .as_deref()
        .ok_or(ApiError::InvalidCredentials)?;
    if !verify_password(&req.password, hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    send_token(&state, creds.user, StatusCode::OK).await
}

/// POST /social-auth - Login or sign up with an identity vouched for by a social provider
#[utoipa::path(
    post,
    path = "/social-auth",
    request_body = SocialAuthRequest,
    responses(
        (status = 200, description = "Session opened")
    )
)]
pub async fn social_auth_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SocialAuthRequest>,
) -> Result<Response, ApiError> {
    if !is_valid_email(&req.email) {
        return Err(ApiError::Validation("Please enter a valid email".to_string()));
    }

    let user = match state.users.get_user_by_email(&req.email).await {
        Ok(creds) => creds.user,
        Err(PortError::NotFound(_)) => {
            state
                .users
                .create_user(NewUser {
                    name: req.name,
                    email: req.email,
                    hashed_password: None,
                    avatar: req.avatar.map(|url| ImageRef {
                        public_id: String::new(),
                        url,
                    }),
                    is_verified: true,
                })
                .await?
        }
        Err(e) => return Err(e.into()),
    };

    send_token(&state, user, StatusCode::OK).await
}

/// GET /logout - Clear the cookies and destroy the session
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    state.sessions.destroy_session(user.id).await?;
    info!("User {} logged out", user.id);

    Ok((
        StatusCode::OK,
        AppendHeaders([
            (header::SET_COOKIE, expired_cookie(ACCESS_COOKIE)),
            (header::SET_COOKIE, expired_cookie(REFRESH_COOKIE)),
        ]),
        Json(json!({
            "success": true,
            "message": "User Logged Out Successfully",
        })),
    ))
}

/// GET /refresh - Rotate both tokens (the work happens in `update_access_token`)
#[utoipa::path(
    get,
    path = "/refresh",
    responses(
        (status = 200, description = "New access and refresh cookies set"),
        (status = 400, description = "Refresh token invalid or session expired")
    )
)]
pub async fn refresh_handler(Extension(issued): Extension<IssuedTokens>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "accessToken": issued.access_token,
    }))
}
