//! Session store: the single source of truth for "is this client authenticated".
//!
//! Holds the bearer token and the cached user record and mirrors them into a
//! [`KeyValueStore`] under `authToken` / `authUser`. There is no expiry logic
//! here; the gateway clears the store when the service answers `401`.

mod storage;

pub use storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError};

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

pub const TOKEN_KEY: &str = "authToken";
pub const USER_KEY: &str = "authUser";

/// Snapshot of the authenticated session.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub token: Option<SecretString>,
    pub user: Option<Value>,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<Session>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.lock().is_authenticated())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Empty store that persists nothing beyond the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            state: Mutex::new(Session::default()),
        }
    }

    /// Hydrates the store from durable storage.
    ///
    /// Unreadable entries are treated as absent; a user record without a token
    /// is ignored.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let token = match storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|value| !value.is_empty()),
            Err(err) => {
                warn!("Failed to read stored session token: {err}");
                None
            }
        };

        let user = if token.is_some() {
            match storage.get(USER_KEY) {
                Ok(raw) => raw.and_then(|raw| serde_json::from_str::<Value>(&raw).ok()),
                Err(err) => {
                    warn!("Failed to read stored session user: {err}");
                    None
                }
            }
        } else {
            None
        };

        debug!(authenticated = token.is_some(), "session hydrated");

        Self {
            storage,
            state: Mutex::new(Session {
                token: token.map(SecretString::from),
                user,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current bearer token, if any.
    #[must_use]
    pub fn get(&self) -> Option<SecretString> {
        self.lock().token.clone()
    }

    /// Cached user record; always `None` without a token.
    #[must_use]
    pub fn user(&self) -> Option<Value> {
        let state = self.lock();
        if state.token.is_some() {
            state.user.clone()
        } else {
            None
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    /// Replaces token and user together. An empty token is not a session and
    /// clears the store instead.
    ///
    /// # Errors
    /// Returns an error if the entries cannot be persisted; the in-memory
    /// session is left unchanged in that case.
    pub fn set(&self, token: SecretString, user: Value) -> Result<(), StorageError> {
        if token.expose_secret().is_empty() {
            debug!("empty token: clearing session");
            self.clear();
            return Ok(());
        }

        let encoded_user = serde_json::to_string(&user)?;
        let mut state = self.lock();
        self.storage.set_many(&[
            (TOKEN_KEY, token.expose_secret()),
            (USER_KEY, encoded_user.as_str()),
        ])?;
        *state = Session {
            token: Some(token),
            user: Some(user),
        };
        debug!("session stored");
        Ok(())
    }

    /// Removes token and user together. Clearing an empty store is a no-op.
    pub fn clear(&self) {
        let mut state = self.lock();
        if let Err(err) = self.storage.remove_many(&[TOKEN_KEY, USER_KEY]) {
            warn!("Failed to remove persisted session: {err}");
        }
        *state = Session::default();
        debug!("session cleared");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_store_has_no_token() {
        let store = SessionStore::in_memory();
        assert!(store.get().is_none());
        assert!(store.user().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn set_replaces_token_and_user() {
        let store = SessionStore::in_memory();
        store
            .set(SecretString::from("first".to_string()), json!({"id": 1}))
            .unwrap();
        store
            .set(SecretString::from("second".to_string()), json!({"id": 2}))
            .unwrap();

        assert_eq!(store.get().unwrap().expose_secret(), "second");
        assert_eq!(store.user(), Some(json!({"id": 2})));
    }

    #[test]
    fn clear_twice_matches_clear_once() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone());
        store
            .set(SecretString::from("token".to_string()), json!({"name": "Ada"}))
            .unwrap();

        store.clear();
        let once = store.snapshot();
        store.clear();
        let twice = store.snapshot();

        assert!(once.token.is_none() && once.user.is_none());
        assert!(twice.token.is_none() && twice.user.is_none());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn set_persists_both_entries() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone());
        store
            .set(SecretString::from("token".to_string()), json!({"id": 7}))
            .unwrap();

        assert_eq!(storage.get(TOKEN_KEY).unwrap(), Some("token".to_string()));
        assert_eq!(
            storage.get(USER_KEY).unwrap(),
            Some("{\"id\":7}".to_string())
        );
    }

    #[test]
    fn load_hydrates_from_storage() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_many(&[(TOKEN_KEY, "stored"), (USER_KEY, "{\"email\":\"a@b.c\"}")])
            .unwrap();

        let store = SessionStore::load(storage);
        assert_eq!(store.get().unwrap().expose_secret(), "stored");
        assert_eq!(store.user(), Some(json!({"email": "a@b.c"})));
    }

    #[test]
    fn load_ignores_user_without_token() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_many(&[(USER_KEY, "{\"id\":1}")]).unwrap();

        let store = SessionStore::load(storage);
        assert!(store.get().is_none());
        assert!(store.user().is_none());
    }

    #[test]
    fn load_survives_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = SessionStore::load(Arc::new(FileStorage::new(&path)));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn debug_output_hides_token() {
        let store = SessionStore::in_memory();
        store
            .set(SecretString::from("very-secret".to_string()), json!({}))
            .unwrap();
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("very-secret"));
    }

    #[test]
    fn empty_token_is_not_a_session() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone());
        store
            .set(SecretString::from("token".to_string()), json!({"id": 1}))
            .unwrap();

        store
            .set(SecretString::from(String::new()), json!({"id": 1}))
            .unwrap();

        assert!(!store.is_authenticated());
        assert!(store.get().is_none());
        assert!(store.user().is_none());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);

        let reloaded = SessionStore::load(storage);
        assert_eq!(reloaded.is_authenticated(), store.is_authenticated());
    }

    /// Reads succeed, every write fails.
    struct ReadOnlyStorage {
        inner: MemoryStorage,
    }

    impl KeyValueStore for ReadOnlyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set_many(&self, _entries: &[(&str, &str)]) -> Result<(), StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn remove_many(&self, _keys: &[&str]) -> Result<(), StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    fn read_only_store() -> SessionStore {
        let inner = MemoryStorage::new();
        inner
            .set_many(&[(TOKEN_KEY, "kept"), (USER_KEY, "{\"id\":3}")])
            .unwrap();
        SessionStore::load(Arc::new(ReadOnlyStorage { inner }))
    }

    #[test]
    fn failed_set_leaves_session_untouched() {
        let store = read_only_store();

        let result = store.set(SecretString::from("replacement".to_string()), json!({"id": 4}));

        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(store.get().unwrap().expose_secret(), "kept");
        assert_eq!(store.user(), Some(json!({"id": 3})));
    }

    #[test]
    fn failed_clear_still_clears_memory() {
        let store = read_only_store();
        assert!(store.is_authenticated());

        store.clear();

        assert!(store.get().is_none());
        assert!(store.user().is_none());
        assert!(!store.is_authenticated());
    }
}
