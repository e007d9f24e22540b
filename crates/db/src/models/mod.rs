//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - Input DTOs for inserts and partial updates

pub mod asset;
pub mod outbox;
pub mod tag;
pub mod user;
