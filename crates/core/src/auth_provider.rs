//! Where a user account's credentials live.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    /// Email + password stored as an argon2 hash.
    Credentials,
    /// Google OAuth; no local password.
    Google,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credentials => "credentials",
            Self::Google => "google",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "credentials" => Ok(Self::Credentials),
            "google" => Ok(Self::Google),
            _ => Err(CoreError::Validation(format!(
                "Invalid auth provider: '{s}'. Must be one of: credentials, google"
            ))),
        }
    }
}

impl TryFrom<String> for AuthProvider {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
