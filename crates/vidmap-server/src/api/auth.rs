//! Account endpoints.
//!
//! - `POST /api/auth/login`: email + password → token
//! - `POST /api/auth/register`: create a password account → token
//! - `POST /api/auth/google`: Google ID token → token (creates or links the account)
//! - `POST /api/auth/change-password`: requires the current password
//! - `PUT  /api/auth/profile-photo`: base64 image, or `null` to clear

use std::sync::LazyLock;

use axum::{extract::State, http::StatusCode, Extension, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use vidmap_db::{DbError, UserRow};

use crate::auth::{hash_password, verify_password, GoogleAuthError, PasswordError, MIN_PASSWORD_LEN};
use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_DISPLAY_NAME_LEN: usize = 100;
const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
static DATA_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:image/[a-zA-Z0-9.+-]+;base64,(?P<payload>.*)$").expect("valid regex")
});

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RegisterRequest {
    #[serde(alias = "name")]
    display_name: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct GoogleSignInRequest {
    credential: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProfilePhotoRequest {
    photo: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct UserProfile {
    id: i64,
    display_name: String,
    email: String,
    photo: Option<String>,
    has_password: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        let has_password = !row.is_oauth_only();
        Self {
            id: row.id,
            display_name: row.display_name,
            email: row.email,
            photo: row.photo,
            has_password,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SessionData {
    token: String,
    user: UserProfile,
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordChanged {
    updated: bool,
}

fn session(state: &AppState, user: UserRow, request_id: String) -> ApiResponse<SessionData> {
    ApiResponse {
        data: SessionData {
            token: state.tokens.issue(user.id),
            user: user.into(),
        },
        meta: ResponseMeta::new(request_id),
    }
}

fn map_password_error(request_id: String, error: &PasswordError) -> ApiError {
    tracing::error!(error = %error, "password hashing failed");
    ApiError::new(request_id, "internal_error", "password processing failed")
}

fn invalid_credentials(request_id: String) -> ApiError {
    ApiError::new(request_id, "invalid_credentials", "invalid email or password")
}

fn validate_new_password(request_id: &str, password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

/// Returns the decoded size of a photo payload, accepting either a bare
/// base64 string or an `image/*` data URL.
pub(super) fn decoded_photo_len(photo: &str) -> Option<usize> {
    let payload = DATA_URL_RE
        .captures(photo)
        .and_then(|c| c.name("payload"))
        .map_or(photo, |m| m.as_str());
    if payload.is_empty() {
        return None;
    }
    STANDARD.decode(payload.trim()).ok().map(|bytes| bytes.len())
}

pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionData>>, ApiError> {
    let user = vidmap_db::get_user_by_email(&state.pool, body.email.trim())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| invalid_credentials(req_id.0.clone()))?;

    let Some(hash) = user.password_hash.clone() else {
        return Err(ApiError::new(
            req_id.0,
            "oauth_only",
            "this account signs in with Google",
        ));
    };

    let matches = verify_password(body.password, hash)
        .await
        .map_err(|e| map_password_error(req_id.0.clone(), &e))?;
    if !matches {
        return Err(invalid_credentials(req_id.0));
    }

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(session(&state, user, req_id.0)))
}

pub(super) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionData>>), ApiError> {
    let display_name = body.display_name.trim();
    if display_name.is_empty() || display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("display_name must be 1-{MAX_DISPLAY_NAME_LEN} characters"),
        ));
    }
    let email = body.email.trim();
    if !EMAIL_RE.is_match(email) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "email address is not valid",
        ));
    }
    validate_new_password(&req_id.0, &body.password)?;

    let hash = hash_password(body.password)
        .await
        .map_err(|e| map_password_error(req_id.0.clone(), &e))?;

    let user = match vidmap_db::create_user(&state.pool, display_name, email, &hash).await {
        Ok(user) => user,
        Err(DbError::DuplicateEmail) => {
            return Err(ApiError::new(
                req_id.0,
                "conflict",
                "an account with this email already exists",
            ));
        }
        Err(e) => return Err(map_db_error(req_id.0, &e)),
    };

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(session(&state, user, req_id.0))))
}

pub(super) async fn google_sign_in(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<GoogleSignInRequest>,
) -> Result<Json<ApiResponse<SessionData>>, ApiError> {
    let Some(verifier) = state.google.as_ref() else {
        return Err(ApiError::new(
            req_id.0,
            "provider_unavailable",
            "Google sign-in is not configured",
        ));
    };
    if body.credential.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "credential must not be empty",
        ));
    }

    let profile = verifier.verify(&body.credential).await.map_err(|e| match e {
        GoogleAuthError::Http(_) | GoogleAuthError::InvalidUrl(_) => {
            tracing::warn!(error = %e, "google tokeninfo request failed");
            ApiError::new(req_id.0.clone(), "bad_gateway", "identity provider unavailable")
        }
        _ => {
            tracing::debug!(error = %e, "google credential rejected");
            ApiError::new(req_id.0.clone(), "auth_invalid", e.to_string())
        }
    })?;

    let user = match vidmap_db::upsert_google_user(&state.pool, &profile).await {
        Ok(user) => user,
        Err(DbError::GoogleAccountConflict | DbError::DuplicateEmail) => {
            tracing::warn!("google sign-in rejected: email linked to another google account");
            return Err(ApiError::new(
                req_id.0,
                "conflict",
                "this email is linked to a different Google account",
            ));
        }
        Err(e) => return Err(map_db_error(req_id.0, &e)),
    };

    tracing::info!(user_id = user.id, "google sign-in");
    Ok(Json(session(&state, user, req_id.0)))
}

pub(super) async fn change_password(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<PasswordChanged>>, ApiError> {
    validate_new_password(&req_id.0, &body.new_password)?;

    let user = vidmap_db::get_user_by_id(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "user not found"))?;

    let Some(current_hash) = user.password_hash else {
        return Err(ApiError::new(
            req_id.0,
            "oauth_only",
            "this account signs in with Google and has no password",
        ));
    };

    let matches = verify_password(body.current_password, current_hash)
        .await
        .map_err(|e| map_password_error(req_id.0.clone(), &e))?;
    if !matches {
        return Err(ApiError::new(
            req_id.0,
            "invalid_credentials",
            "current password is incorrect",
        ));
    }

    let new_hash = hash_password(body.new_password)
        .await
        .map_err(|e| map_password_error(req_id.0.clone(), &e))?;
    vidmap_db::update_password_hash(&state.pool, user_id, &new_hash)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(user_id, "password changed");
    Ok(Json(ApiResponse {
        data: PasswordChanged { updated: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn update_profile_photo(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<ProfilePhotoRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    if let Some(photo) = body.photo.as_deref() {
        match decoded_photo_len(photo) {
            None => {
                return Err(ApiError::new(
                    req_id.0,
                    "validation_error",
                    "photo must be base64 image data",
                ));
            }
            Some(len) if len > MAX_PHOTO_BYTES => {
                return Err(ApiError::new(
                    req_id.0,
                    "validation_error",
                    "photo exceeds 2 MiB",
                ));
            }
            Some(_) => {}
        }
    }

    let user = match vidmap_db::update_photo(&state.pool, user_id, body.photo.as_deref()).await {
        Ok(user) => user,
        Err(DbError::NotFound) => {
            return Err(ApiError::new(req_id.0, "not_found", "user not found"));
        }
        Err(e) => return Err(map_db_error(req_id.0, &e)),
    };

    Ok(Json(ApiResponse {
        data: user.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
