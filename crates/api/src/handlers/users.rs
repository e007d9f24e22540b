//! Handlers for the `/users` resource (the caller's own profile).

use axum::extract::State;
use axum::Json;
use segment3d_core::error::CoreError;
use segment3d_core::types::{DbId, Timestamp};
use segment3d_db::models::user::{UpdateProfile, User};
use segment3d_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Public profile. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub avatar: String,
    pub provider: String,
    pub password_changed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            avatar: user.avatar.clone(),
            provider: user.provider.as_str().to_string(),
            password_changed_at: user.password_changed_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Request body for `PATCH /users`. Empty strings leave a field unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// Request body for `PATCH /users/password`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub old_password: String,
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/users
pub async fn get_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UserView>>> {
    let user = load_user(&state, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: UserView::from(&user),
    }))
}

/// PATCH /api/users
pub async fn update_me(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidJson(input): ValidJson<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserView>>> {
    let update = UpdateProfile {
        name: non_empty(input.name),
        avatar: non_empty(input.avatar),
    };

    let user = UserRepo::update_profile(&state.pool, auth.user_id, &update)
        .await?
        .ok_or_else(|| CoreError::not_found("User", auth.user_id))?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(DataResponse {
        data: UserView::from(&user),
    }))
}

/// PATCH /api/users/password
///
/// Requires the current password. Google accounts have none to change.
pub async fn change_password(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidJson(input): ValidJson<ChangePasswordRequest>,
) -> AppResult<Json<DataResponse<UserView>>> {
    let user = load_user(&state, auth.user_id).await?;

    let Some(current_hash) = user.password_hash.as_deref() else {
        return Err(AppError::BadRequest(format!(
            "Accounts signed in with {} have no password",
            user.provider
        )));
    };

    let old_valid = verify_password(&input.old_password, current_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !old_valid {
        return Err(AppError::BadRequest("Old password is incorrect".into()));
    }

    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    if !UserRepo::update_password(&state.pool, user.id, &new_hash).await? {
        return Err(CoreError::not_found("User", user.id).into());
    }

    let user = load_user(&state, auth.user_id).await?;
    tracing::info!(user_id = %user.id, "Password changed");
    Ok(Json(DataResponse {
        data: UserView::from(&user),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", id).into())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
