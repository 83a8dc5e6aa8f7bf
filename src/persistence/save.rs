//! Session save slot

use super::envelope::Envelope;
use super::{PersistenceError, Result, Storage};
use crate::sim::SessionSnapshot;

/// Persistence collaborator for whole-session snapshots
pub trait SaveSystem {
    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<()>;

    /// Read the saved snapshot; `NotFound` when nothing has been saved
    fn load(&self) -> Result<SessionSnapshot>;

    fn exists(&self) -> bool;

    fn delete(&mut self) -> Result<()>;
}

/// `SaveSystem` that keeps a single enveloped snapshot under one storage key
pub struct StorageSaveSystem<S: Storage> {
    storage: S,
    key: String,
}

impl<S: Storage> StorageSaveSystem<S> {
    /// Storage key
    pub const DEFAULT_KEY: &'static str = "memory_match_save";

    pub fn new(storage: S) -> Self {
        Self::with_key(storage, Self::DEFAULT_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }
}

impl<S: Storage> SaveSystem for StorageSaveSystem<S> {
    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        let json = Envelope::new(snapshot.clone(), crate::unix_millis()).seal()?;
        self.storage.set_item(&self.key, &json)?;
        log::info!(
            "Game saved ({} cards, {} pairs matched, score {})",
            snapshot.board.cards.len(),
            snapshot.matched_pairs(),
            snapshot.current_score
        );
        Ok(())
    }

    fn load(&self) -> Result<SessionSnapshot> {
        let Some(json) = self.storage.get_item(&self.key)? else {
            log::info!("No saved game found");
            return Err(PersistenceError::NotFound(self.key.clone()));
        };
        let envelope: Envelope<SessionSnapshot> = Envelope::open(&json)?;
        log::info!(
            "Game data loaded ({} cards, {} pairs matched)",
            envelope.payload.board.cards.len(),
            envelope.payload.matched_pairs()
        );
        Ok(envelope.payload)
    }

    fn exists(&self) -> bool {
        self.storage.contains(&self.key)
    }

    fn delete(&mut self) -> Result<()> {
        self.storage.remove_item(&self.key)?;
        log::info!("Saved game cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use crate::sim::{BoardSnapshot, CardRecord};

    fn sample() -> SessionSnapshot {
        SessionSnapshot {
            board: BoardSnapshot {
                cards: vec![
                    CardRecord::new("apple", false, true, glam::Vec3::new(-60.0, 0.0, 0.0)),
                    CardRecord::new("apple", false, true, glam::Vec3::new(60.0, 0.0, 0.0)),
                ],
                rows: 1,
                columns: 2,
                grid_constraint: 2,
            },
            current_score: 100,
            current_combo: 1,
            game_time_seconds: 4.5,
            total_moves: 1,
            high_score: 900,
        }
    }

    #[test]
    fn test_load_without_save_is_not_found() {
        let saves = StorageSaveSystem::new(MemoryStorage::new());
        assert!(!saves.exists());
        let err = saves.load().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_save_load_delete() {
        let mut saves = StorageSaveSystem::new(MemoryStorage::new());
        saves.save(&sample()).unwrap();
        assert!(saves.exists());
        assert_eq!(saves.load().unwrap(), sample());

        saves.delete().unwrap();
        assert!(!saves.exists());
        assert!(saves.load().unwrap_err().is_not_found());
    }

    #[test]
    fn test_corrupt_save_is_recoverable_error() {
        let storage = MemoryStorage::new();
        storage
            .set_item(StorageSaveSystem::<MemoryStorage>::DEFAULT_KEY, "{\"version\":1,")
            .unwrap();
        let saves = StorageSaveSystem::new(storage);
        assert!(saves.exists());
        assert!(matches!(saves.load(), Err(PersistenceError::Json(_))));
    }
}
