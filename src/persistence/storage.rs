//! Storage backends

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{PersistenceError, Result, Storage};

/// In-memory storage for tests and throwaway sessions.
///
/// Clones share the same map, so a save system and a stats tracker can
/// observe each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.items.borrow().contains_key(key)
    }
}

/// File-backed storage: one `{key}.json` file per key inside `base_dir`.
///
/// Writes go to a temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// Create the storage, creating `base_dir` if needed
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn item_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PersistenceError::Invalid(format!("bad storage key '{}'", key)));
        }
        Ok(self.base_dir.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path)?;
        log::debug!("Read {} bytes from {}", value.len(), path.display());
        Ok(Some(value))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.item_path(key)?;
        let temp_path = path.with_extension("json.tmp");

        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;

        log::debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.item_path(key)?;
        if path.exists() {
            fs::remove_file(&path)?;
            log::debug!("Removed {}", path.display());
        }
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.item_path(key).map(|p| p.exists()).unwrap_or(false)
    }
}

/// Browser LocalStorage (wasm only)
#[cfg(target_arch = "wasm32")]
pub struct WebStorage {
    inner: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl WebStorage {
    /// Open `window.localStorage`
    pub fn local() -> Result<Self> {
        let inner = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| PersistenceError::Backend("localStorage is unavailable".to_string()))?;
        Ok(Self { inner })
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for WebStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.inner
            .get_item(key)
            .map_err(|e| PersistenceError::Backend(format!("{:?}", e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .set_item(key, value)
            .map_err(|e| PersistenceError::Backend(format!("{:?}", e)))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.inner
            .remove_item(key)
            .map_err(|e| PersistenceError::Backend(format!("{:?}", e)))
    }
}
