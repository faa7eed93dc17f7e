//! Rehber core library.
//!
//! Client for the student-counseling dashboard API: the response envelope,
//! an HTTP client for the API's endpoints, and the session layer that keeps
//! the bearer token and signed-in user across runs.
//!
//! ```rust,ignore
//! use rehber_core::Config;
//!
//! let auth = Config::load()?.auth_client()?;
//! let envelope = auth.login("a@b.com", "secret").await;
//! if envelope.success {
//!     let stats = auth.authorized_api()?.dashboard_stats().await?;
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiEnvelope, ApiError, ApiResult};
pub use auth::{AuthClient, AuthState, Session, SessionStore};
pub use config::{Config, SessionBackend};
