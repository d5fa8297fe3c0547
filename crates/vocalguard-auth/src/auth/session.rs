use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use super::storage::SessionStorage;

/// Storage key holding the raw bearer token
pub const TOKEN_KEY: &str = "vocalguard_token";

/// Storage key holding the JSON-serialized user profile
pub const USER_KEY: &str = "vocalguard_user";

/// The token/profile pair. Both halves are set together on sign-in and
/// cleared together on sign-out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<Value>,
}

impl Session {
    pub fn new(token: String, user: Value) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
        }
    }

    /// Load session from storage.
    ///
    /// Never fails: unreadable keys and a user entry that is not valid JSON
    /// are treated as absent.
    pub fn load(storage: &dyn SessionStorage) -> Self {
        let token = match storage.get_item(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        };

        let user = match storage.get_item(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Null) => None,
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Ignoring stored user that is not valid JSON");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user");
                None
            }
        };

        debug!(has_token = token.is_some(), has_user = user.is_some(), "Session loaded");
        Self { token, user }
    }

    /// Write both keys, token first.
    pub fn save(&self, storage: &dyn SessionStorage) -> Result<()> {
        let token = self
            .token
            .as_deref()
            .context("Cannot save a session without a token")?;
        let user = Self::user_json(self.user.as_ref())?;
        storage.set_items(&[(TOKEN_KEY, token), (USER_KEY, user.as_str())])
    }

    /// Write only the user key, leaving the stored token alone.
    pub fn save_user(user: &Value, storage: &dyn SessionStorage) -> Result<()> {
        let user = Self::user_json(Some(user))?;
        storage.set_item(USER_KEY, &user)
    }

    /// Remove both keys from storage.
    pub fn erase(storage: &dyn SessionStorage) -> Result<()> {
        storage.remove_items(&[TOKEN_KEY, USER_KEY])
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&Value> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn user_json(user: Option<&Value>) -> Result<String> {
        serde_json::to_string(user.unwrap_or(&Value::Null)).context("Failed to serialize user")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::MemoryStorage;
    use serde_json::json;

    #[test]
    fn test_load_empty_storage() {
        let storage = MemoryStorage::new();
        let session = Session::load(&storage);
        assert_eq!(session, Session::default());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_save_then_load() {
        let storage = MemoryStorage::new();
        Session::new("t1".to_string(), json!({"id": 1, "email": "a@b.c"}))
            .save(&storage)
            .unwrap();

        assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("t1"));
        assert_eq!(
            storage.get_item(USER_KEY).unwrap().as_deref(),
            Some(r#"{"email":"a@b.c","id":1}"#)
        );

        let session = Session::load(&storage);
        assert_eq!(session.token(), Some("t1"));
        assert_eq!(session.user(), Some(&json!({"id": 1, "email": "a@b.c"})));
    }

    #[test]
    fn test_corrupt_user_is_ignored() {
        let storage = MemoryStorage::new();
        storage.set_item(TOKEN_KEY, "t1").unwrap();
        storage.set_item(USER_KEY, "{not json").unwrap();

        let session = Session::load(&storage);
        assert_eq!(session.token(), Some("t1"));
        assert!(session.user().is_none());
    }

    #[test]
    fn test_null_user_and_empty_token_are_absent() {
        let storage = MemoryStorage::new();
        storage.set_item(TOKEN_KEY, "").unwrap();
        storage.set_item(USER_KEY, "null").unwrap();

        assert_eq!(Session::load(&storage), Session::default());
    }

    #[test]
    fn test_save_without_token_fails() {
        let storage = MemoryStorage::new();
        assert!(Session::default().save(&storage).is_err());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_erase_removes_both_keys() {
        let storage = MemoryStorage::new();
        Session::new("t1".to_string(), json!({"id": 1}))
            .save(&storage)
            .unwrap();

        Session::erase(&storage).unwrap();
        assert!(storage.is_empty());
    }
}
