//! Domain types and pure logic for the Segment3D asset backend.
//!
//! Nothing in this crate performs I/O. The database, broker, and HTTP layers
//! build on the types defined here.

pub mod asset_status;
pub mod asset_type;
pub mod auth_provider;
pub mod error;
pub mod slug;
pub mod storage;
pub mod tag_filter;
pub mod types;
