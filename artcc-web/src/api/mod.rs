//! HTTP API handlers

pub mod admin;
pub mod error;
pub mod events;
pub mod extract;
pub mod health;
pub mod login;
pub mod roster;
pub mod session;
pub mod weather;

pub use error::{ApiError, ApiResult};
pub use extract::{CurrentUser, MaybeUser};
