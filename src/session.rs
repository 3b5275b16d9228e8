//! Durable session token storage.
//!
//! The token lives in memory behind a lock and is mirrored to a small JSON
//! file so a login survives restarts. Persistence is synchronous and
//! happens before the in-memory update: once `set_token` returns, the
//! token is on disk, so any call that observes the new session state can
//! rely on it having been saved.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Shared handle to the login session. Cheap to clone; every clone sees
/// the same token, including reads from spawned fetch tasks.
#[derive(Debug, Clone)]
pub struct Session {
  token: Arc<RwLock<Option<String>>>,
  path: PathBuf,
}

impl Session {
  /// Open the session store at `path`, restoring a persisted token when
  /// one is present. A token file that does not parse is removed and the
  /// session starts logged out.
  pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
    let path = path.into();
    let token = match std::fs::read_to_string(&path) {
      Ok(raw) => match serde_json::from_str::<String>(&raw) {
        Ok(token) => {
          debug!("Restored session token from {}", path.display());
          Some(token)
        }
        Err(e) => {
          warn!("Discarding unreadable token file {}: {}", path.display(), e);
          let _ = std::fs::remove_file(&path);
          None
        }
      },
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
      Err(e) => return Err(eyre!("Failed to read token file {}: {}", path.display(), e)),
    };

    Ok(Session {
      token: Arc::new(RwLock::new(token)),
      path,
    })
  }

  /// Default token location under the platform data directory.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("tally").join("token.json"))
  }

  /// Current token, if logged in. A poisoned lock reads as logged out.
  pub fn token(&self) -> Option<String> {
    self.token.read().ok()?.clone()
  }

  pub fn is_authenticated(&self) -> bool {
    self.token().is_some()
  }

  /// Persist `token` to disk, then publish it to all session handles.
  pub fn set_token(&self, token: &str) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
    }
    let encoded = serde_json::to_string(token)?;
    std::fs::write(&self.path, encoded)
      .map_err(|e| eyre!("Failed to write token file {}: {}", self.path.display(), e))?;

    let mut guard = self.token.write().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    *guard = Some(token.to_string());
    Ok(())
  }

  /// Remove the persisted token, then clear it from memory. The very next
  /// remote call sees the session as logged out.
  pub fn clear(&self) -> Result<()> {
    match std::fs::remove_file(&self.path) {
      Ok(()) => {}
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => {
        return Err(eyre!("Failed to remove token file {}: {}", self.path.display(), e));
      }
    }

    let mut guard = self.token.write().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    *guard = None;
    Ok(())
  }
}
