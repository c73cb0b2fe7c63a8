//! Herodex API Library
//!
//! This crate contains the API server components for Herodex.

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod routes;
pub mod state;
pub mod users;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
