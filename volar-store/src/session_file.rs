use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{info, warn};
use volar_core::{Credentials, CoreResult, ReservationError, SessionStore};
use volar_shared::Masked;

/// On-disk layout; keys match what the mobile app kept in its key-value storage.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    #[serde(rename = "authToken")]
    auth_token: Masked<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<i64>,
}

/// Session persisted as a small JSON file. The file exists exactly while a
/// user is signed in.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    current: watch::Sender<Option<Credentials>>,
}

impl FileSessionStore {
    /// Opens the store, loading any previously saved session. A missing file
    /// means signed out; an unreadable one is logged and treated the same.
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let loaded = read_session(&path)?;
        if loaded.is_some() {
            info!("Restored session from {}", path.display());
        }
        Ok(Self {
            path,
            current: watch::Sender::new(loaded),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_session(path: &Path) -> CoreResult<Option<Credentials>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ReservationError::Session(e.to_string())),
    };

    match serde_json::from_str::<StoredSession>(&raw) {
        Ok(stored) if !stored.auth_token.expose().is_empty() => Ok(Some(Credentials {
            token: stored.auth_token,
            user_id: stored.user_id,
        })),
        Ok(_) => Ok(None),
        Err(e) => {
            warn!("Ignoring corrupt session file {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

impl SessionStore for FileSessionStore {
    fn credentials(&self) -> Option<Credentials> {
        self.current.borrow().clone()
    }

    fn sign_in(&self, credentials: Credentials) -> CoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ReservationError::Session(e.to_string()))?;
        }

        let stored = StoredSession {
            auth_token: credentials.token.clone(),
            user_id: credentials.user_id,
        };
        let body = serde_json::to_string_pretty(&stored)
            .map_err(|e| ReservationError::Session(e.to_string()))?;
        fs::write(&self.path, body).map_err(|e| ReservationError::Session(e.to_string()))?;

        info!(user_id = ?credentials.user_id, "Session saved to {}", self.path.display());
        self.current.send_replace(Some(credentials));
        Ok(())
    }

    fn sign_out(&self) -> CoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ReservationError::Session(e.to_string())),
        }
        info!("Session removed from {}", self.path.display());
        self.current.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Credentials>> {
        self.current.subscribe()
    }
}
