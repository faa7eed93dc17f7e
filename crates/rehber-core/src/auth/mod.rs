//! Authentication module for managing the client-side session.
//!
//! This module provides:
//! - `KeyValueStore`: String key/value media the session is persisted to
//!   (in-memory, JSON file, or the OS keychain via `KeyringStore`)
//! - `SessionStore`: The injectable interface over the persisted token and user
//! - `Session`: The `SessionStore` implementation over any `KeyValueStore`
//! - `AuthClient`: Login/logout against the API, driving the session store
//!
//! Tokens are opaque; this layer never checks their freshness. The server
//! confirms a stale token by rejecting the next authenticated call.

pub mod client;
pub mod credentials;
pub mod session;
pub mod storage;

pub use client::AuthClient;
pub use credentials::KeyringStore;
pub use session::{AuthState, Session, SessionError, SessionStore, TOKEN_KEY, USER_KEY};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
