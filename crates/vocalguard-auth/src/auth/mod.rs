//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: sign-in operations and the current token/user
//! - `Session`: the token/profile pair and how it maps onto storage keys
//! - `SessionStorage`: file, keychain and in-memory storage backends
//! - `AuthOutcome`: the success/failure value every operation returns
//!
//! Sessions never expire on their own; they end on logout or when the server
//! rejects the token.

pub mod credentials;
pub mod outcome;
pub mod session;
pub mod storage;
pub mod store;

pub use credentials::KeyringStorage;
pub use outcome::AuthOutcome;
pub use session::{Session, TOKEN_KEY, USER_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::SessionStore;
