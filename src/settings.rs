//! Board and scoring settings
//!
//! Pure data: nothing in here holds callbacks or references to live game objects.
//! Persisted separately from game saves under its own storage key.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::persistence::{PersistenceError, Storage};

/// Errors raised when settings cannot describe a playable board
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid dimensions must be positive, got {rows}x{columns}")]
    NonPositiveGrid { rows: i32, columns: i32 },

    #[error("grid {rows}x{columns} has an odd number of cells")]
    OddCardCount { rows: i32, columns: i32 },

    #[error("grid constraint count must be positive, got {0}")]
    NonPositiveConstraint(i32),

    #[error("identity pool is empty")]
    EmptyIdentityPool,

    #[error("combo multiplier cap {0} is below 1")]
    MultiplierCapBelowOne(f32),
}

/// Board size presets offered by the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GridPreset {
    #[default]
    Tiny,
    Small,
    Medium,
    Large,
}

impl GridPreset {
    pub const ALL: [GridPreset; 4] = [
        GridPreset::Tiny,
        GridPreset::Small,
        GridPreset::Medium,
        GridPreset::Large,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GridPreset::Tiny => "2x2",
            GridPreset::Small => "2x3",
            GridPreset::Medium => "5x6",
            GridPreset::Large => "6x8",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "2x2" | "tiny" => Some(GridPreset::Tiny),
            "2x3" | "small" => Some(GridPreset::Small),
            "5x6" | "medium" | "med" => Some(GridPreset::Medium),
            "6x8" | "large" => Some(GridPreset::Large),
            _ => None,
        }
    }

    /// (rows, columns)
    pub fn dimensions(&self) -> (i32, i32) {
        match self {
            GridPreset::Tiny => (2, 2),
            GridPreset::Small => (2, 3),
            GridPreset::Medium => (5, 6),
            GridPreset::Large => (6, 8),
        }
    }
}

/// Default identity pool: enough distinct faces for the largest preset
pub fn default_identities() -> Vec<String> {
    [
        "apple", "banana", "cherry", "grape", "lemon", "lime", "mango", "melon", "orange",
        "peach", "pear", "plum", "kiwi", "coconut", "fig", "papaya", "apricot", "guava",
        "lychee", "olive", "quince", "date", "berry", "pomelo",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Board tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSettings {
    pub rows: i32,
    pub columns: i32,
    /// Cells per row used by the layout; persisted independently of `columns`
    pub grid_constraint: i32,
    /// Pause between the second pick and match resolution
    pub match_check_delay_secs: f32,
    /// How long every card stays face-up when a game starts
    pub initial_reveal_secs: f32,
    /// Faces available to the board (matched by name on restore)
    #[serde(default = "default_identities")]
    pub identities: Vec<String>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            grid_constraint: DEFAULT_GRID_CONSTRAINT,
            match_check_delay_secs: DEFAULT_MATCH_CHECK_DELAY_SECS,
            initial_reveal_secs: DEFAULT_INITIAL_REVEAL_SECS,
            identities: default_identities(),
        }
    }
}

impl BoardSettings {
    /// Board settings for a menu preset (constraint follows the column count)
    pub fn from_preset(preset: GridPreset) -> Self {
        let (rows, columns) = preset.dimensions();
        Self {
            rows,
            columns,
            grid_constraint: columns,
            ..Self::default()
        }
    }

    pub fn card_count(&self) -> usize {
        (self.rows.max(0) as usize) * (self.columns.max(0) as usize)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows <= 0 || self.columns <= 0 {
            return Err(ConfigError::NonPositiveGrid {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if self.card_count() % 2 != 0 {
            return Err(ConfigError::OddCardCount {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if self.grid_constraint <= 0 {
            return Err(ConfigError::NonPositiveConstraint(self.grid_constraint));
        }
        if self.identities.is_empty() {
            return Err(ConfigError::EmptyIdentityPool);
        }
        Ok(())
    }
}

/// Scoring and combo tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringSettings {
    /// Points for each successful match before the combo bonus
    pub base_match_score: i32,
    /// Flat bonus for clearing the board
    pub game_completion_bonus: i32,
    /// Longest gap between matches that keeps a combo alive
    pub combo_time_window_secs: f32,
    pub max_combo_multiplier: f32,
    pub combo_multiplier_increment: f32,
    /// Shortest gap between matches that still counts toward a combo
    pub min_time_between_matches_secs: f32,
    pub time_bonus_per_second: f32,
    pub max_time_bonus: i32,
    /// Added to the score on a failed match (usually negative)
    pub failed_match_penalty: i32,
    pub apply_failed_match_penalty: bool,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            base_match_score: DEFAULT_BASE_MATCH_SCORE,
            game_completion_bonus: DEFAULT_COMPLETION_BONUS,
            combo_time_window_secs: DEFAULT_COMBO_WINDOW_SECS,
            max_combo_multiplier: DEFAULT_MAX_COMBO_MULTIPLIER,
            combo_multiplier_increment: DEFAULT_COMBO_MULTIPLIER_INCREMENT,
            min_time_between_matches_secs: DEFAULT_MIN_TIME_BETWEEN_MATCHES_SECS,
            time_bonus_per_second: DEFAULT_TIME_BONUS_PER_SECOND,
            max_time_bonus: DEFAULT_MAX_TIME_BONUS,
            failed_match_penalty: DEFAULT_FAILED_MATCH_PENALTY,
            apply_failed_match_penalty: true,
        }
    }
}

impl ScoringSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_combo_multiplier.is_nan() || self.max_combo_multiplier < 1.0 {
            return Err(ConfigError::MultiplierCapBelowOne(self.max_combo_multiplier));
        }
        Ok(())
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    pub board: BoardSettings,
    pub scoring: ScoringSettings,
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "memory_match_settings";

    /// Create settings from a grid preset with default scoring
    pub fn from_preset(preset: GridPreset) -> Self {
        Self {
            board: BoardSettings::from_preset(preset),
            scoring: ScoringSettings::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.board.validate()?;
        self.scoring.validate()
    }

    /// Load settings from storage, falling back to defaults
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from storage");
                    return settings;
                }
                Err(e) => log::warn!("Stored settings are unreadable ({}), using defaults", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not read settings ({}), using defaults", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to storage
    pub fn save(&self, storage: &dyn Storage) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(self)?;
        storage.set_item(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_defaults_match_original_tunables() {
        let s = Settings::default();
        assert_eq!(s.board.rows, 2);
        assert_eq!(s.board.columns, 2);
        assert_eq!(s.board.grid_constraint, 2);
        assert_eq!(s.scoring.base_match_score, 100);
        assert_eq!(s.scoring.game_completion_bonus, 1000);
        assert_eq!(s.scoring.failed_match_penalty, -10);
        assert!(s.scoring.apply_failed_match_penalty);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        for preset in GridPreset::ALL {
            let settings = Settings::from_preset(preset);
            assert!(settings.validate().is_ok(), "{} invalid", preset.as_str());
            assert!(settings.board.identities.len() * 2 >= settings.board.card_count());
            assert_eq!(GridPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(GridPreset::from_str("LARGE"), Some(GridPreset::Large));
        assert_eq!(GridPreset::from_str("3x3"), None);
    }

    #[test]
    fn test_validation_errors() {
        let mut board = BoardSettings::default();
        board.rows = 3;
        board.columns = 3;
        assert_eq!(
            board.validate(),
            Err(ConfigError::OddCardCount { rows: 3, columns: 3 })
        );

        board.rows = 0;
        assert!(matches!(
            board.validate(),
            Err(ConfigError::NonPositiveGrid { .. })
        ));

        let mut board = BoardSettings::default();
        board.identities.clear();
        assert_eq!(board.validate(), Err(ConfigError::EmptyIdentityPool));

        let mut scoring = ScoringSettings::default();
        scoring.max_combo_multiplier = 0.5;
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn test_settings_round_trip_through_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(Settings::load(&storage), Settings::default());

        let mut settings = Settings::from_preset(GridPreset::Medium);
        settings.scoring.apply_failed_match_penalty = false;
        settings.save(&storage).unwrap();

        assert_eq!(Settings::load(&storage), settings);
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let storage = MemoryStorage::new();
        storage.set_item(Settings::STORAGE_KEY, "{not json").unwrap();
        assert_eq!(Settings::load(&storage), Settings::default());
    }
}
