//! User entity model and DTOs.

use segment3d_core::auth_provider::AuthProvider;
use segment3d_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- never serialize this to API responses
/// directly; the API layer maps it to its own response type.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub avatar: String,
    /// `None` for Google accounts.
    pub password_hash: Option<String>,
    #[sqlx(try_from = "String")]
    pub provider: AuthProvider,
    pub password_changed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub avatar: String,
    pub password_hash: Option<String>,
    pub provider: AuthProvider,
}

/// Profile edit. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub avatar: Option<String>,
}
