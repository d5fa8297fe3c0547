//! Client-side session helper for the VocalGuard authentication API.
//!
//! A [`SessionStore`] keeps the bearer token and user profile, persists them
//! through a [`SessionStorage`] backend, and performs signup, login, Google
//! login and current-user requests through an [`HttpTransport`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use vocalguard_auth::{MemoryStorage, ReqwestTransport, SessionStore};
//!
//! # async fn run() -> Result<(), vocalguard_auth::ApiError> {
//! let store = SessionStore::new(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(ReqwestTransport::new()?),
//!     "http://localhost:5000",
//! );
//! let outcome = store.login("user@example.com", "hunter22").await;
//! assert_eq!(outcome.is_success(), store.is_authenticated());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;

pub use api::{ApiError, AuthClient, HttpTransport, ReqwestTransport};
pub use auth::{
    AuthOutcome, FileStorage, KeyringStorage, MemoryStorage, Session, SessionStorage,
    SessionStore,
};
pub use config::{Config, StorageBackend};
