//! Save/load persistence
//!
//! Features:
//! - Key/value `Storage` abstraction (in-memory, one JSON file per key, or browser LocalStorage)
//! - Versioned JSON envelope around saved sessions
//! - `SaveSystem` contract consumed by the session coordinator
//! - Missing saves surface as `NotFound`, never as a panic

pub mod envelope;
pub mod save;
pub mod storage;

pub use envelope::{Envelope, SAVE_FORMAT_VERSION};
pub use save::{SaveSystem, StorageSaveSystem};
pub use storage::{FileStorage, MemoryStorage};
#[cfg(target_arch = "wasm32")]
pub use storage::WebStorage;

use thiserror::Error;

/// Errors surfaced by storage backends and save systems
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("no saved data under key '{0}'")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save format version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("invalid saved data: {0}")]
    Invalid(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl PersistenceError {
    /// True when the error only means "nothing saved yet"
    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistenceError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Durable key/value string storage (LocalStorage-shaped)
pub trait Storage {
    /// Read the value under `key`, `None` if absent
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Check whether `key` holds a value
    fn contains(&self, key: &str) -> bool {
        matches!(self.get_item(key), Ok(Some(_)))
    }
}
