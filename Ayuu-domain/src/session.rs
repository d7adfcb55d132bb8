//! Signed-in user context.
//!
//! The current user is persisted as a JSON blob through a [`SessionStore`].
//! [`SessionContext`] owns the only load/sign-in/sign-out path; a blob that
//! fails to parse is logged and treated as "no session".

use std::path::PathBuf;
use std::sync::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::entities::user::CurrentUser;

/// Session persistence errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session lock poisoned: {0}")]
    Lock(String),
}

/// Where the raw session blob lives
pub trait SessionStore: Send + Sync {
    /// The stored blob, if any
    fn load_raw(&self) -> Result<Option<String>, SessionError>;

    fn save_raw(&self, blob: &str) -> Result<(), SessionError>;

    fn clear(&self) -> Result<(), SessionError>;
}

/// Session blob kept in a file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load_raw(&self) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_raw(&self, blob: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, blob)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session blob kept in memory
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    blob: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a raw blob
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self { blob: Mutex::new(Some(blob.into())) }
    }
}

impl SessionStore for MemorySessionStore {
    fn load_raw(&self) -> Result<Option<String>, SessionError> {
        let blob = self.blob.lock().map_err(|e| SessionError::Lock(e.to_string()))?;
        Ok(blob.clone())
    }

    fn save_raw(&self, value: &str) -> Result<(), SessionError> {
        let mut blob = self.blob.lock().map_err(|e| SessionError::Lock(e.to_string()))?;
        *blob = Some(value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut blob = self.blob.lock().map_err(|e| SessionError::Lock(e.to_string()))?;
        *blob = None;
        Ok(())
    }
}

/// The signed-in user, cached over a persistent store
pub struct SessionContext<S: SessionStore> {
    store: S,
    current: RwLock<Option<CurrentUser>>,
}

impl<S: SessionStore> SessionContext<S> {
    /// Wrap a store. Nothing is read until `load`.
    pub fn new(store: S) -> Self {
        Self { store, current: RwLock::new(None) }
    }

    /// Read the stored session. Missing and malformed blobs both yield `None`;
    /// only storage failures are errors.
    pub fn load(&self) -> Result<Option<CurrentUser>, SessionError> {
        let user = match self.store.load_raw()? {
            None => None,
            Some(blob) => match serde_json::from_str::<CurrentUser>(&blob) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Ignoring malformed session data: {}", e);
                    None
                }
            },
        };

        self.set_current(user.clone())?;
        debug!("Session loaded, signed in: {}", user.is_some());
        Ok(user)
    }

    /// Persist `user` as the current session
    pub fn sign_in(&self, user: CurrentUser) -> Result<(), SessionError> {
        let blob = serde_json::to_string(&user)?;
        self.store.save_raw(&blob)?;
        info!("Session started for {} ({})", user.username, user.role);
        self.set_current(Some(user))
    }

    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        if let Some(user) = self.current() {
            info!("Session ended for {}", user.username);
        }
        self.set_current(None)
    }

    /// The cached user, as of the last load or sign-in
    pub fn current(&self) -> Option<CurrentUser> {
        self.current.read().ok().and_then(|current| current.clone())
    }

    fn set_current(&self, user: Option<CurrentUser>) -> Result<(), SessionError> {
        let mut current = self.current.write().map_err(|e| SessionError::Lock(e.to_string()))?;
        *current = user;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::Role;
    use uuid::Uuid;

    #[test]
    fn test_sign_in_load_sign_out() {
        let context = SessionContext::new(MemorySessionStore::new());
        assert!(context.load().unwrap().is_none());

        let user = CurrentUser::new("u1", "asha", Role::Doctor, "Dr. Asha");
        context.sign_in(user.clone()).unwrap();
        assert_eq!(context.current(), Some(user.clone()));
        assert_eq!(context.load().unwrap(), Some(user));

        context.sign_out().unwrap();
        assert!(context.current().is_none());
        assert!(context.load().unwrap().is_none());
    }

    #[test]
    fn test_malformed_blob_is_no_session() {
        let context = SessionContext::new(MemorySessionStore::with_blob("{not json"));
        assert!(context.load().unwrap().is_none());

        let wrong_role = r#"{"id":"u1","username":"a","role":"janitor","fullName":"A"}"#;
        let context = SessionContext::new(MemorySessionStore::with_blob(wrong_role));
        assert!(context.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!("ayuu-session-{}.json", Uuid::new_v4()));
        let store = FileSessionStore::new(&path);
        assert!(store.load_raw().unwrap().is_none());

        let context = SessionContext::new(store);
        let user = CurrentUser::new("u2", "front.desk", Role::Staff, "Front Desk");
        context.sign_in(user.clone()).unwrap();

        let reopened = SessionContext::new(FileSessionStore::new(&path));
        assert_eq!(reopened.load().unwrap(), Some(user));

        reopened.sign_out().unwrap();
        assert!(!path.exists());
    }
}
