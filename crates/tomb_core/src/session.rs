//! Live state of one game session, as far as saving is concerned.

use serde::{Deserialize, Serialize};

use crate::gameflow::GameFlow;
use crate::item::Item;
use crate::object::ObjectTable;
use crate::player::{PlayerState, PointerTables};
use crate::slots::SlotList;
use crate::start_info::{BonusFlags, StartInfo, initialise_start_info};

pub const TITLE_SIZE: usize = 75;
pub const MAX_FLIP_MAPS: usize = 10;
pub const REQUESTER_VISIBLE_LINES: usize = 5;

/// Campaign progress carried across levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub start: Vec<StartInfo>,
    pub timer: u32,
    pub kills: u32,
    pub secrets: u16,
    pub pickups: u8,
    pub bonus: BonusFlags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipState {
    pub status: i32,
    /// Trigger state per flip map; only the high byte is persisted.
    pub table: [i16; MAX_FLIP_MAPS],
    pub effect: i32,
    pub timer: i32,
}

/// What the level loader set up before a save is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelState {
    pub objects: ObjectTable,
    pub items: Vec<Item>,
    /// Flags of every fixed camera.
    pub cameras: Vec<i16>,
    pub tables: PointerTables,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    pub flow: GameFlow,
    pub info: GameInfo,
    pub current_level: u16,
    pub save_counter: i32,
    pub saved_games_count: usize,
    pub flip: FlipState,
    pub level: LevelState,
    pub player: PlayerState,
    pub slots: SlotList,
    pub(crate) buffer: Vec<u8>,
    pub(crate) filled: usize,
}

impl GameSession {
    /// A new game: every level gets its starting loadout.
    pub fn new(flow: GameFlow) -> Self {
        let mut start = vec![StartInfo::default(); flow.level_count()];
        initialise_start_info(&mut start, &flow, BonusFlags::empty());
        let buffer = vec![0; flow.save.buffer_capacity];
        let slots = SlotList::new(flow.save.slot_count, REQUESTER_VISIBLE_LINES);

        Self {
            current_level: flow.first_level as u16,
            flow,
            info: GameInfo {
                start,
                ..GameInfo::default()
            },
            save_counter: 0,
            saved_games_count: 0,
            flip: FlipState::default(),
            level: LevelState::default(),
            player: PlayerState::default(),
            slots,
            buffer,
            filled: 0,
        }
    }

    pub fn with_level(mut self, level: LevelState) -> Self {
        self.level = level;
        self
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Bytes produced by the last `fill_buffer`.
    pub fn filled(&self) -> &[u8] {
        &self.buffer[..self.filled]
    }

    pub fn current_title(&self) -> &str {
        self.flow.level_title(self.current_level as usize)
    }

    /// Requester text of a used slot.
    pub fn slot_text(title: &str, counter: i32) -> String {
        format!("{title} {counter}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::start_info::StartFlags;

    #[test]
    fn new_session_starts_on_first_level() {
        let session = GameSession::new(GameFlow::default());
        assert_eq!(session.current_level, 1);
        assert_eq!(session.current_title(), "Caves");
        assert_eq!(session.buffer().len(), 10 * 1024);
        assert_eq!(session.slots.entries.len(), 16);
        assert!(session.info.start[1].flags.contains(StartFlags::AVAILABLE));
        assert!(session.filled().is_empty());
    }
}
