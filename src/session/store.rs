//! Token Store
//!
//! Persistent storage for the single bearer token. No validation happens
//! here; the session service decides what a stored token means.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::error::{StoreError, StoreResult};

/// Fixed key the token is stored under
pub const TOKEN_KEY: &str = "auth_token";

/// Pass-through persistence for the bearer token
pub trait TokenStore: Send + Sync {
    fn save(&self, token: &str) -> StoreResult<()>;

    fn read(&self) -> Option<String>;

    fn clear(&self) -> StoreResult<()>;
}

/// Token kept in a file named after [`TOKEN_KEY`] inside the state directory,
/// so it survives restarts.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(TOKEN_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, token: &str) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // A file left by an older run keeps its mode, so tighten it too
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(token.as_bytes())?;
        tracing::debug!(path = ?self.path, "Token saved");
        Ok(())
    }

    fn read(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(token) => {
                let token = token.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = ?self.path, "Failed to read token: {}", e);
                None
            }
        }
    }

    fn clear(&self) -> StoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

/// In-process store for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str) -> StoreResult<()> {
        let mut slot = self.token.lock().map_err(|e| StoreError::Lock(e.to_string()))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn read(&self) -> Option<String> {
        self.token.lock().ok().and_then(|slot| slot.clone())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut slot = self.token.lock().map_err(|e| StoreError::Lock(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}
