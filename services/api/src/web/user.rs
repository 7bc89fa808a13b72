//! services/api/src/web/user.rs
//!
//! Profile endpoints for the logged-in user. Every change replaces the cached
//! session value so later requests see the updated record.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use coursehub_core::ports::UploadOptions;
use coursehub_core::User;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::error::ApiError;
use crate::web::auth::is_valid_email;
use crate::web::state::{AppState, AuthUser};

const AVATAR_FOLDER: &str = "avatars";
const AVATAR_WIDTH: u32 = 150;

#[derive(Deserialize, ToSchema)]
pub struct UpdateInfoRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAvatarRequest {
    /// Base64 or data-URI encoded image.
    pub avatar: String,
}

async fn refresh_session(state: &AppState, user: &User) -> Result<(), ApiError> {
    state.sessions.create_session(user).await?;
    Ok(())
}

/// GET /me - The session's user record
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The logged-in user"),
        (status = 400, description = "Not logged in")
    )
)]
pub async fn me_handler(Extension(AuthUser(user)): Extension<AuthUser>) -> impl IntoResponse {
    Json(json!({ "success": true, "user": user }))
}

/// PUT /update-info - Change name and/or email
#[utoipa::path(
    put,
    path = "/update-info",
    request_body = UpdateInfoRequest,
    responses(
        (status = 201, description = "Profile updated"),
        (status = 400, description = "Invalid or duplicate email")
    )
)]
pub async fn update_info_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(session_user)): Extension<AuthUser>,
    Json(req): Json<UpdateInfoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = state.users.get_user_by_id(session_user.id).await?;

    if let Some(email) = req.email.filter(|e| *e != user.email) {
        if !is_valid_email(&email) {
            return Err(ApiError::Validation("Please enter a valid email".to_string()));
        }
        if state.users.email_exists(&email).await? {
            return Err(ApiError::Conflict("Email already exists".to_string()));
        }
        user.email = email;
    }
    if let Some(name) = req.name.filter(|n| !n.trim().is_empty()) {
        user.name = name.trim().to_string();
    }

    let user = state.users.update_user(&user).await?;
    refresh_session(&state, &user).await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "user": user }))))
}

/// PUT /update-password - Change the password after checking the current one
#[utoipa::path(
    put,
    path = "/update-password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 201, description = "Password changed"),
        (status = 400, description = "Missing fields, wrong password, or social account")
    )
)]
pub async fn update_password_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(session_user)): Extension<AuthUser>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.old_password.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::Validation(
            "Please enter old and new password".to_string(),
        ));
    }

    let creds = state.users.get_credentials_by_id(session_user.id).await?;
    let current = creds.hashed_password.as_deref().ok_or_else(|| {
        ApiError::Validation("This account signs in through a social provider".to_string())
    })?;
    if !verify_password(&req.old_password, current)? {
        return Err(ApiError::InvalidCredentials);
    }
    if req.new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let hashed = hash_password(&req.new_password)?;
    state.users.update_password(creds.user.id, &hashed).await?;
    refresh_session(&state, &creds.user).await?;
    info!("User {} changed their password", creds.user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "user": creds.user })),
    ))
}

/// PUT /update-avatar - Replace the profile picture
#[utoipa::path(
    put,
    path = "/update-avatar",
    request_body = UpdateAvatarRequest,
    responses(
        (status = 200, description = "Avatar replaced"),
        (status = 400, description = "Image host failure")
    )
)]
pub async fn update_avatar_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(session_user)): Extension<AuthUser>,
    Json(req): Json<UpdateAvatarRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.avatar.trim().is_empty() {
        return Err(ApiError::Validation("Please provide an avatar".to_string()));
    }
    let mut user = state.users.get_user_by_id(session_user.id).await?;

    // No compensation: if the upload fails after this, the old image is gone.
    if let Some(old) = user.avatar.as_ref().filter(|a| !a.public_id.is_empty()) {
        state
            .images
            .destroy_image(&old.public_id)
            .await
            .map_err(|e| ApiError::upstream(StatusCode::BAD_REQUEST, e))?;
    }

    let uploaded = state
        .images
        .upload_image(
            &req.avatar,
            &UploadOptions {
                folder: AVATAR_FOLDER.to_string(),
                width: Some(AVATAR_WIDTH),
            },
        )
        .await
        .map_err(|e| {
            warn!("Avatar upload failed for user {}: {}", user.id, e);
            ApiError::upstream(StatusCode::BAD_REQUEST, e)
        })?;
    user.avatar = Some(uploaded);

    let user = state.users.update_user(&user).await?;
    refresh_session(&state, &user).await?;

    Ok((StatusCode::OK, Json(json!({ "success": true, "user": user }))))
}
