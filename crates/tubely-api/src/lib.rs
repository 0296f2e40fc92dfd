//! Tubely API Library
//!
//! HTTP surface for the upload pipeline: handlers, bearer-token auth, error
//! rendering and application bootstrap.

mod handlers;
mod telemetry;
mod utils;

pub mod auth;
pub mod constants;
pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
