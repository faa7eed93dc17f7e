//! REST API client module for the counseling dashboard API.
//!
//! This module provides the `ApiClient` for communicating with the remote
//! API and the `ApiEnvelope` every endpoint wraps its payload in.
//!
//! The API uses bearer token authentication obtained through the
//! `/auth/login` endpoint.

pub mod client;
pub mod envelope;
pub mod error;

pub use client::ApiClient;
pub use envelope::ApiEnvelope;
pub use error::{ApiError, ApiResult};
