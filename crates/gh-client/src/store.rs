//! Credential Store
//!
//! Durable, synchronous persistence for the active session. The store owns
//! three logical fields (bearer token, role mirror, serialized user) kept in
//! a single JSON document so a save can never leave them torn.

use gh_common::{Role, User};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// The persisted session document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    /// Mirror of `user.role`, kept as its own field so consumers that only
    /// need the role do not have to touch the user record.
    pub role: Role,
    pub user: User,
}

/// Synchronous session persistence.
///
/// Every operation is infallible from the caller's point of view: a missing
/// or malformed document loads as `None`, and write failures are logged and
/// swallowed so a broken disk can never block a logout.
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Persist the whole session. Token and user always land together.
    fn save(&self, token: &str, user: &User);

    /// Read the persisted session, or `None` if absent or unreadable.
    fn load(&self) -> Option<StoredSession>;

    /// Remove every field the store owns.
    fn clear(&self);

    /// The bearer token alone, for request signing.
    fn token(&self) -> Option<String> {
        self.load().map(|s| s.token)
    }
}

/// File-backed store, one JSON document on disk.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, token: &str, user: &User) {
        let doc = StoredSession {
            token: token.to_string(),
            role: user.role,
            user: user.clone(),
        };

        let bytes = match serde_json::to_vec_pretty(&doc) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Could not serialize session document");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(error = %e, "Could not create credential directory");
                return;
            }
        }

        // Write-then-rename keeps the document whole under interruption.
        let tmp = self.path.with_extension("tmp");
        if let Err(e) = fs::write(&tmp, &bytes).and_then(|_| fs::rename(&tmp, &self.path)) {
            warn!(error = %e, path = %self.path.display(), "Could not persist session");
        }
    }

    fn load(&self) -> Option<StoredSession> {
        let bytes = fs::read(&self.path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(error = %e, "Stored session is unreadable, treating as no session");
                None
            }
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "Could not clear stored session"),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<StoredSession>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, token: &str, user: &User) {
        *self.inner.lock() = Some(StoredSession {
            token: token.to_string(),
            role: user.role,
            user: user.clone(),
        });
    }

    fn load(&self) -> Option<StoredSession> {
        self.inner.lock().clone()
    }

    fn clear(&self) {
        *self.inner.lock() = None;
    }
}
