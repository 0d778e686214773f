//! Read-only view of a save file's fixed header.
//!
//! Everything up to the flip table can be decoded without the level's object
//! table, so this works on any save given only the campaign's level count.

use serde::Serialize;

use crate::codec::{ItemStats, Record};
use crate::cursor::{ByteCursor, SkipAccounting};
use crate::error::SaveError;
use crate::layout::{FileLayout, SectionId};
use crate::session::{MAX_FLIP_MAPS, TITLE_SIZE};
use crate::start_info::{BonusFlags, StartInfo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub title: String,
    pub counter: i32,
    pub start: Vec<StartInfo>,
    pub timer: u32,
    pub kills: u32,
    pub secrets: u16,
    pub level: u16,
    pub pickups: u8,
    pub bonus: BonusFlags,
    pub item_stats: ItemStats,
    pub flip_status: i32,
    pub flip_table: [i8; MAX_FLIP_MAPS],
    pub file_len: usize,
}

impl SaveSummary {
    pub fn decode(bytes: &[u8], level_count: usize) -> Result<Self, SaveError> {
        let mut c = ByteCursor::new(bytes, SkipAccounting::Counted);
        let title = c.read_fixed_string(TITLE_SIZE)?;
        let counter = c.read_i32()?;

        let mut start = Vec::with_capacity(level_count);
        for _ in 0..level_count {
            start.push(StartInfo::decode(&mut c)?);
        }

        let timer = c.read_u32()?;
        let kills = c.read_u32()?;
        let secrets = c.read_u16()?;
        let level = c.read_u16()?;
        let pickups = c.read_u8()?;
        let bonus = BonusFlags::from_bits_retain(c.read_u8()?);
        let item_stats = ItemStats::decode(&mut c)?;
        let flip_status = c.read_i32()?;

        let mut flip_table = [0i8; MAX_FLIP_MAPS];
        for flag in flip_table.iter_mut() {
            *flag = c.read_i8()?;
        }

        Ok(Self {
            title,
            counter,
            start,
            timer,
            kills,
            secrets,
            level,
            pickups,
            bonus,
            item_stats,
            flip_status,
            flip_table,
            file_len: bytes.len(),
        })
    }

    /// Sections this summary was decoded from, with everything after the flip
    /// table as a single body range.
    pub fn layout(&self) -> FileLayout {
        let mut layout = FileLayout::default();
        let mut end = TITLE_SIZE;
        layout.push(SectionId::Title, end);
        end += 4;
        layout.push(SectionId::Counter, end);
        end += self.start.len() * StartInfo::SIZE;
        layout.push(SectionId::StartInfo, end);
        end += 14;
        layout.push(SectionId::Aggregate, end);
        end += ItemStats::SIZE;
        layout.push(SectionId::ItemStats, end);
        end += 4;
        layout.push(SectionId::FlipStatus, end);
        end += MAX_FLIP_MAPS;
        layout.push(SectionId::FlipTable, end);
        layout.push(SectionId::Body, self.file_len);
        layout.file_len = self.file_len;
        layout
    }
}
