//! Campaign description: level list, save file naming and buffer options.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cursor::SkipAccounting;
use crate::error::SaveError;

pub const DEFAULT_BUFFER_CAPACITY: usize = 10 * 1024;
pub const DEFAULT_SLOT_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelType {
    Gym,
    #[default]
    Normal,
    Cutscene,
    /// Placeholder standing for whichever level is being played. Its start
    /// info always mirrors the current level's.
    Current,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEntry {
    pub title: String,
    #[serde(default)]
    pub level_type: LevelType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    pub buffer_capacity: usize,
    pub slot_count: usize,
    pub skip_accounting: SkipAccounting,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            slot_count: DEFAULT_SLOT_COUNT,
            skip_accounting: SkipAccounting::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameFlow {
    pub levels: Vec<LevelEntry>,
    #[serde(default)]
    pub gym_level: Option<usize>,
    pub first_level: usize,
    /// File name of a save slot; `{slot}` is replaced by the slot index.
    pub save_file_pattern: String,
    /// Requester text of an empty slot; `{slot}` is replaced by the 1-based
    /// slot number.
    pub empty_slot_pattern: String,
    #[serde(default)]
    pub save: SaveOptions,
}

impl Default for GameFlow {
    fn default() -> Self {
        let mut levels = vec![LevelEntry {
            title: "Lara's Home".to_string(),
            level_type: LevelType::Gym,
        }];
        levels.extend(
            [
                "Caves",
                "City of Vilcabamba",
                "Lost Valley",
                "Tomb of Qualopec",
                "St. Francis' Folly",
                "Colosseum",
                "Palace Midas",
                "The Cistern",
                "Tomb of Tihocan",
                "City of Khamoon",
                "Obelisk of Khamoon",
                "Sanctuary of the Scion",
                "Natla's Mines",
                "Atlantis",
                "The Great Pyramid",
            ]
            .into_iter()
            .map(|title| LevelEntry {
                title: title.to_string(),
                level_type: LevelType::Normal,
            }),
        );
        levels.push(LevelEntry {
            title: "Current Position".to_string(),
            level_type: LevelType::Current,
        });

        Self {
            levels,
            gym_level: Some(0),
            first_level: 1,
            save_file_pattern: "saveati.{slot}".to_string(),
            empty_slot_pattern: "- EMPTY SLOT {slot} -".to_string(),
            save: SaveOptions::default(),
        }
    }
}

impl GameFlow {
    pub fn from_json_str(text: &str) -> Result<Self, SaveError> {
        let flow: Self =
            serde_json::from_str(text).map_err(|err| SaveError::Config(err.to_string()))?;
        flow.validate()?;
        Ok(flow)
    }

    pub fn from_path(path: &Path) -> Result<Self, SaveError> {
        let text = fs::read_to_string(path).map_err(|source| SaveError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        if self.levels.is_empty() {
            return Err(SaveError::Config("level list is empty".to_string()));
        }
        if let Some(gym) = self.gym_level {
            if gym >= self.levels.len() {
                return Err(SaveError::Config(format!(
                    "gym level {gym} is outside the {} level list",
                    self.levels.len()
                )));
            }
        }
        if self.first_level >= self.levels.len() {
            return Err(SaveError::Config(format!(
                "first level {} is outside the {} level list",
                self.first_level,
                self.levels.len()
            )));
        }
        if !self.save_file_pattern.contains("{slot}") {
            return Err(SaveError::Config(
                "save file pattern must contain {slot}".to_string(),
            ));
        }
        if self.save.slot_count == 0 {
            return Err(SaveError::Config("slot count must be positive".to_string()));
        }
        Ok(())
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Title of `level`, or an empty string past the end of the list.
    pub fn level_title(&self, level: usize) -> &str {
        self.levels
            .get(level)
            .map(|entry| entry.title.as_str())
            .unwrap_or("")
    }

    pub fn save_file_name(&self, slot: usize) -> String {
        self.save_file_pattern.replace("{slot}", &slot.to_string())
    }

    pub fn empty_slot_text(&self, slot: usize) -> String {
        self.empty_slot_pattern
            .replace("{slot}", &(slot + 1).to_string())
    }

    /// Levels whose start info mirrors the current level.
    pub fn current_aliases(&self) -> impl Iterator<Item = usize> + '_ {
        self.levels
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.level_type == LevelType::Current)
            .map(|(index, _)| index)
    }
}
