use anyhow::{Context, Result};
use keyring::Entry;

use super::storage::SessionStorage;

pub const DEFAULT_SERVICE_NAME: &str = "vocalguard";

/// Session storage in the OS keychain, one entry per key.
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl SessionStorage for KeyringStorage {
    /// Retrieve a value from the OS keychain
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve value from keychain"),
        }
    }

    /// Store a value in the OS keychain
    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store value in keychain")
    }

    /// Delete a stored value; deleting a missing entry is not an error
    fn remove_item(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::{TOKEN_KEY, USER_KEY};

    // Needs a real OS keychain; run with `--ignored` on a desktop session
    #[test]
    #[ignore]
    fn test_keyring_roundtrip() {
        let storage = KeyringStorage::new("vocalguard-auth-test");

        storage
            .set_items(&[(TOKEN_KEY, "t1"), (USER_KEY, r#"{"id":1}"#)])
            .unwrap();
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("t1"));

        // A second handle on the same service sees the same entries
        let reopened = KeyringStorage::new("vocalguard-auth-test");
        assert_eq!(
            reopened.get_item(USER_KEY).unwrap().as_deref(),
            Some(r#"{"id":1}"#)
        );

        storage.remove_items(&[TOKEN_KEY, USER_KEY]).unwrap();
        assert_eq!(reopened.get_item(TOKEN_KEY).unwrap(), None);
        assert_eq!(reopened.get_item(USER_KEY).unwrap(), None);
    }
}
