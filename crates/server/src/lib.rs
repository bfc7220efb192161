//! HTTP API server for Sample It.
//!
//! This crate provides the HTTP surface of the backend:
//! - Sample upload (multipart) with optional BPM/key analysis
//! - Sample listing and lookup
//! - Per-user saved samples
//! - Account registration and bearer token sessions
//! - Local object serving and Prometheus metrics

pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use auth::{AuthenticatedUser, TraceId};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
