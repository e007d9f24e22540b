//! Authentication extractors.
//!
//! - [`auth::AuthUser`] -- Requires a valid JWT Bearer token.
//! - [`auth::OptionalAuthUser`] -- Accepts anonymous callers; validates a token when present.
//! - [`auth::WorkerAuth`] -- Requires the shared worker callback token.

pub mod auth;
