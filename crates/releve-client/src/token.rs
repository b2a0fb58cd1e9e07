//! Durable storage for the bearer token.

use std::{
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Mutex,
};

use releve_core::{Error, Result, portal::TokenStore};

/// Token persisted as a plain file — the terminal analog of the browser's
/// localStorage entry.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
  path: PathBuf,
}

impl FileTokenStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path { &self.path }
}

impl TokenStore for FileTokenStore {
  fn load(&self) -> Result<Option<String>> {
    match fs::read_to_string(&self.path) {
      Ok(raw) => {
        let token = raw.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
      }
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(Error::Storage(e.to_string())),
    }
  }

  fn save(&self, token: &str) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
    }
    fs::write(&self.path, token).map_err(|e| Error::Storage(e.to_string()))
  }

  fn clear(&self) -> Result<()> {
    match fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(Error::Storage(e.to_string())),
    }
  }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
  token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
  pub fn new() -> Self { Self::default() }

  pub fn with_token(token: &str) -> Self {
    Self { token: Mutex::new(Some(token.to_string())) }
  }

  fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
    self.token.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl TokenStore for MemoryTokenStore {
  fn load(&self) -> Result<Option<String>> { Ok(self.slot().clone()) }

  fn save(&self, token: &str) -> Result<()> {
    *self.slot() = Some(token.to_string());
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    *self.slot() = None;
    Ok(())
  }
}
