pub mod assets;
pub mod auth;
pub mod tags;
pub mod users;
