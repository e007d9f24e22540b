//! Handlers for the `/auth` resource (signup, signin, Google sign-in).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use segment3d_core::auth_provider::AuthProvider;
use segment3d_core::error::CoreError;
use segment3d_db::models::user::{CreateUser, User};
use segment3d_db::repositories::user_repo::EMAIL_CONSTRAINT;
use segment3d_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::google::GoogleError;
use crate::auth::jwt::generate_access_token;
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::handlers::users::UserView;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/signin`.
#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

/// Request body for `POST /auth/google`.
#[derive(Debug, Deserialize, Validate)]
pub struct GoogleRequest {
    /// OAuth access token obtained by the browser.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub token: String,
}

/// Successful authentication response returned by every sign-in flow.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub message: &'static str,
    pub user: UserView,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/signup
///
/// Register a credentials account and sign it in.
pub async fn signup(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let create = CreateUser {
        email: input.email.trim().to_string(),
        name: input.name.trim().to_string(),
        avatar: String::new(),
        password_hash: Some(password_hash),
        provider: AuthProvider::Credentials,
    };

    let user = UserRepo::create(&state.pool, &create).await.map_err(|e| {
        if segment3d_db::is_unique_violation(&e, EMAIL_CONSTRAINT) {
            AppError::Core(CoreError::Conflict("Email is already registered".into()))
        } else {
            AppError::Database(e)
        }
    })?;

    tracing::info!(user_id = %user.id, "User signed up");

    let response = auth_response(&state, &user, "Registration success")?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/signin
///
/// Authenticate with email + password.
pub async fn signin(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<SigninRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    let Some(hash) = user.password_hash.as_deref() else {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Please sign in using {}",
            user.provider
        ))));
    };

    let password_valid = verify_password(&input.password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = %user.id, "Sign-in rejected: wrong password");
        return Err(invalid_credentials());
    }

    tracing::info!(user_id = %user.id, "User signed in");
    Ok(Json(auth_response(&state, &user, "Login success")?))
}

/// POST /api/auth/google
///
/// Exchange a Google access token for a session. The account is created on
/// first sign-in.
pub async fn google(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<GoogleRequest>,
) -> AppResult<Json<AuthResponse>> {
    let info = state.google.user_info(&input.token).await.map_err(|e| match e {
        GoogleError::Rejected(_) => {
            AppError::Core(CoreError::Unauthorized("Invalid Google token".into()))
        }
        GoogleError::MissingEmail => {
            AppError::Core(CoreError::Validation("Google account has no email".into()))
        }
        other => AppError::Core(CoreError::Upstream(format!("Google userinfo: {other}"))),
    })?;

    let user = match UserRepo::find_by_email(&state.pool, &info.email).await? {
        Some(user) => user,
        None => {
            let create = CreateUser {
                email: info.email.clone(),
                name: info.name.clone(),
                avatar: info.picture.clone(),
                password_hash: None,
                provider: AuthProvider::Google,
            };
            match UserRepo::create(&state.pool, &create).await {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, "User created from Google sign-in");
                    user
                }
                // A concurrent first sign-in created the row.
                Err(e) if segment3d_db::is_unique_violation(&e, EMAIL_CONSTRAINT) => {
                    UserRepo::find_by_email(&state.pool, &info.email)
                        .await?
                        .ok_or(AppError::Database(e))?
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    if user.provider != AuthProvider::Google {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Please sign in using {}",
            user.provider
        ))));
    }

    tracing::info!(user_id = %user.id, "User signed in with Google");
    Ok(Json(auth_response(&state, &user, "Login success")?))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
}

fn auth_response(state: &AppState, user: &User, message: &'static str) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, &user.email, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    Ok(AuthResponse {
        access_token,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        message,
        user: UserView::from(user),
    })
}
