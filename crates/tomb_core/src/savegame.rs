//! Encoding a session into the save buffer and restoring it again.
//!
//! Loading happens in two phases. [`GameSession::load_header_only`] reads a
//! slot into the buffer and returns the saved level so the host can load that
//! level. Once items, creatures and triggers exist, [`GameSession::apply_buffer`]
//! restores everything else.

use std::io::{Read, Write};

use tracing::{debug, error, info, warn};

use crate::codec::{ItemStats, Record};
use crate::cursor::ByteCursor;
use crate::error::SaveError;
use crate::hooks::{Inventory, LevelHooks};
use crate::layout::{FileLayout, SectionId};
use crate::object::ObjectId;
use crate::player::{NO_BOX, read_player, write_player};
use crate::schema::{ApplyContext, apply_item, write_item};
use crate::session::{GameSession, TITLE_SIZE};
use crate::start_info::{BonusFlags, create_start_info, read_table, skip_table, write_table};
use crate::storage::{FileSystem, OpenMode};

const COUNTER_LEN: usize = 4;

impl GameSession {
    /// Encode the whole session into the save buffer and return the byte
    /// range of every section written.
    ///
    /// Running out of buffer is fatal for the save: nothing is written to
    /// disk and the error reports the size that would have been needed.
    pub fn fill_buffer(&mut self, inventory: &dyn Inventory) -> Result<FileLayout, SaveError> {
        self.fill_buffer_inner(inventory).inspect_err(|err| {
            if err.is_fatal() {
                error!("{err}");
            }
        })
    }

    fn fill_buffer_inner(&mut self, inventory: &dyn Inventory) -> Result<FileLayout, SaveError> {
        self.check_start_table()?;
        let current = self.current_level as usize;
        if let Some(start) = self.info.start.get_mut(current) {
            create_start_info(start, inventory, &self.player);
        }

        self.filled = 0;
        let mut c = ByteCursor::new(&mut self.buffer[..], self.flow.save.skip_accounting);
        c.zero_fill();
        let mut layout = FileLayout::default();

        c.write_fixed_string(self.flow.level_title(current), TITLE_SIZE)?;
        layout.push(SectionId::Title, c.offset());
        c.write_i32(self.save_counter)?;
        layout.push(SectionId::Counter, c.offset());

        if let Some(&live) = self.info.start.get(current) {
            for level in self.flow.current_aliases() {
                if let Some(start) = self.info.start.get_mut(level) {
                    *start = live;
                }
            }
        }
        write_table(&mut c, &self.info.start)?;
        layout.push(SectionId::StartInfo, c.offset());

        c.write_u32(self.info.timer)?;
        c.write_u32(self.info.kills)?;
        c.write_u16(self.info.secrets)?;
        c.write_u16(self.current_level)?;
        c.write_u8(self.info.pickups)?;
        c.write_u8(self.info.bonus.bits())?;
        layout.push(SectionId::Aggregate, c.offset());

        item_stats(inventory).encode(&mut c)?;
        layout.push(SectionId::ItemStats, c.offset());

        c.write_i32(self.flip.status)?;
        layout.push(SectionId::FlipStatus, c.offset());
        for &flag in &self.flip.table {
            c.write_i8((flag >> 8) as i8)?;
        }
        layout.push(SectionId::FlipTable, c.offset());

        for &flags in &self.level.cameras {
            c.write_i16(flags)?;
        }
        layout.push(SectionId::Cameras, c.offset());

        for (index, item) in self.level.items.iter().enumerate() {
            write_item(&mut c, item, self.level.objects.get(item.object_id))?;
            layout.push(SectionId::Item(index), c.offset());
        }

        write_player(&mut c, &self.player, &self.level.tables)?;
        layout.push(SectionId::Player, c.offset());

        c.write_i32(self.flip.effect)?;
        c.write_i32(self.flip.timer)?;
        layout.push(SectionId::Trailer, c.offset());

        layout.file_len = c.consumed();
        self.filled = c.consumed();
        debug!(bytes = self.filled, "save buffer filled");
        Ok(layout)
    }

    /// Restore the session from the save buffer.
    ///
    /// `current_level` must already hold the level returned by
    /// [`GameSession::load_header_only`], and the level state must be the
    /// freshly loaded level.
    pub fn apply_buffer(
        &mut self,
        inventory: &mut dyn Inventory,
        hooks: &mut dyn LevelHooks,
    ) -> Result<(), SaveError> {
        self.check_start_table()?;
        let skip_doppelganger_flags = self.needs_doppelganger_fix();
        if skip_doppelganger_flags {
            info!("enabling doppelganger savegame fix");
        }

        let mut c = ByteCursor::new(&self.buffer[..], self.flow.save.skip_accounting);
        c.skip(TITLE_SIZE);
        c.skip(COUNTER_LEN);

        read_table(&mut c, &mut self.info.start)?;

        self.info.timer = c.read_u32()?;
        self.info.kills = c.read_u32()?;
        self.info.secrets = c.read_u16()?;
        self.current_level = c.read_u16()?;
        self.info.pickups = c.read_u8()?;
        self.info.bonus = BonusFlags::from_bits_retain(c.read_u8()?);

        let current = self.current_level as usize;
        for level in self.flow.current_aliases() {
            if let Some(&alias) = self.info.start.get(level) {
                if let Some(start) = self.info.start.get_mut(current) {
                    *start = alias;
                }
            }
        }

        let start = self.info.start.get(current).copied().unwrap_or_default();
        inventory.reset_for_level(self.current_level, &start);
        let stats = ItemStats::decode(&mut c)?;
        add_item_stats(inventory, &stats);

        let flip_status = c.read_i32()?;
        if flip_status != 0 {
            hooks.flip_map();
        }
        self.flip.status = flip_status;
        for flag in self.flip.table.iter_mut() {
            *flag = (c.read_i8()? as i16) << 8;
        }

        for flags in self.level.cameras.iter_mut() {
            *flags = c.read_i16()?;
        }

        let mut ctx = ApplyContext {
            hooks,
            inventory: &*inventory,
            skip_doppelganger_flags,
        };
        for (index, item) in self.level.items.iter_mut().enumerate() {
            let info = *self.level.objects.get(item.object_id);
            apply_item(&mut c, index, item, &info, &mut ctx)?;
        }

        let node = self.player.lot.node;
        read_player(&mut c, &mut self.player, &self.level.tables)?;
        self.player.lot.node = node;
        self.player.lot.target_box = NO_BOX;

        self.flip.effect = c.read_i32()?;
        self.flip.timer = c.read_i32()?;
        debug!(bytes = c.consumed(), "save buffer applied");
        Ok(())
    }

    /// First loading phase: read `slot` into the save buffer and return the
    /// level it was saved on.
    pub fn load_header_only<F: FileSystem>(
        &mut self,
        fs: &F,
        slot: usize,
    ) -> Result<u16, SaveError> {
        let name = self.slot_file_name(slot)?;
        debug!(file = %name, "loading save header");
        let file = fs.open(&name, OpenMode::Read).map_err(|source| SaveError::Open {
            path: fs.path_of(&name),
            source,
        })?;

        let mut bytes = Vec::with_capacity(self.buffer.len());
        file.take(self.buffer.len() as u64).read_to_end(&mut bytes)?;
        self.buffer.fill(0);
        self.buffer[..bytes.len()].copy_from_slice(&bytes);

        let mut c = ByteCursor::new(&self.buffer[..], self.flow.save.skip_accounting);
        c.skip(TITLE_SIZE);
        c.skip(COUNTER_LEN);
        skip_table(&mut c, self.flow.level_count());
        c.skip(4); // timer
        c.skip(4); // kills
        c.skip(2); // secrets
        c.read_u16()
    }

    /// Encode the session and write it to `slot`. Only the bytes actually
    /// produced are written, never the whole buffer.
    pub fn save_to_file<F: FileSystem>(
        &mut self,
        fs: &F,
        slot: usize,
        inventory: &dyn Inventory,
    ) -> Result<(), SaveError> {
        let name = self.slot_file_name(slot)?;
        self.fill_buffer(inventory)?;

        debug!(file = %name, bytes = self.filled, "writing save");
        let mut file = fs.open(&name, OpenMode::Write).map_err(|source| SaveError::Open {
            path: fs.path_of(&name),
            source,
        })?;
        file.write_all(&self.buffer[..self.filled])?;
        file.flush()?;

        let text = Self::slot_text(self.current_title(), self.save_counter);
        self.slots.set(slot, text, false);
        self.saved_games_count += 1;
        self.save_counter += 1;
        Ok(())
    }

    /// Rebuild the slot list from the files on disk. Every slot is visited;
    /// the one with the highest counter becomes the requested slot.
    pub fn scan_saved_games<F: FileSystem>(&mut self, fs: &F) {
        self.slots.clear();
        self.slots.requested = 0;
        self.save_counter = 0;
        self.saved_games_count = 0;

        for slot in 0..self.flow.save.slot_count {
            let name = self.flow.save_file_name(slot);
            match fs.open(&name, OpenMode::Read) {
                Ok(file) => {
                    let (title, counter) = read_slot_header(file, &name);
                    self.slots.push(Self::slot_text(&title, counter), false);
                    if counter > self.save_counter {
                        self.save_counter = counter;
                        self.slots.requested = slot;
                    }
                    self.saved_games_count += 1;
                }
                Err(err) => {
                    debug!(file = %name, %err, "slot is empty");
                    self.slots.push(self.flow.empty_slot_text(slot), true);
                }
            }
        }

        self.slots.scroll_to_requested();
        self.save_counter += 1;
    }

    // Readers that only know the gameflow skip one record per level, so the
    // table must have exactly that many.
    fn check_start_table(&self) -> Result<(), SaveError> {
        let entries = self.info.start.len();
        let levels = self.flow.level_count();
        if entries != levels {
            return Err(SaveError::Config(format!(
                "start info table has {entries} entries but the gameflow has {levels} levels"
            )));
        }
        Ok(())
    }

    fn slot_file_name(&self, slot: usize) -> Result<String, SaveError> {
        let count = self.flow.save.slot_count;
        if slot >= count {
            return Err(SaveError::InvalidSlot { slot, count });
        }
        Ok(self.flow.save_file_name(slot))
    }
}

fn read_slot_header(file: impl Read, name: &str) -> (String, i32) {
    let mut header = Vec::with_capacity(TITLE_SIZE + COUNTER_LEN);
    if let Err(err) = file
        .take((TITLE_SIZE + COUNTER_LEN) as u64)
        .read_to_end(&mut header)
    {
        warn!(file = %name, %err, "failed to read slot header");
    }
    if header.len() < TITLE_SIZE + COUNTER_LEN {
        warn!(file = %name, len = header.len(), "slot file is shorter than its header");
        header.resize(TITLE_SIZE + COUNTER_LEN, 0);
    }

    let mut c = ByteCursor::new(&header[..], Default::default());
    let title = c.read_fixed_string(TITLE_SIZE).unwrap_or_default();
    let counter = c.read_i32().unwrap_or_default();
    (title, counter)
}

fn item_stats(inventory: &dyn Inventory) -> ItemStats {
    let count = |object| inventory.request_item(object) as u8;
    ItemStats {
        pickup1: count(ObjectId::PICKUP_ITEM1),
        pickup2: count(ObjectId::PICKUP_ITEM2),
        puzzle1: count(ObjectId::PUZZLE_ITEM1),
        puzzle2: count(ObjectId::PUZZLE_ITEM2),
        puzzle3: count(ObjectId::PUZZLE_ITEM3),
        puzzle4: count(ObjectId::PUZZLE_ITEM4),
        key1: count(ObjectId::KEY_ITEM1),
        key2: count(ObjectId::KEY_ITEM2),
        key3: count(ObjectId::KEY_ITEM3),
        key4: count(ObjectId::KEY_ITEM4),
        leadbar: count(ObjectId::LEADBAR_ITEM),
    }
}

fn add_item_stats(inventory: &mut dyn Inventory, stats: &ItemStats) {
    let counts = [
        (ObjectId::PICKUP_ITEM1, stats.pickup1),
        (ObjectId::PICKUP_ITEM2, stats.pickup2),
        (ObjectId::PUZZLE_ITEM1, stats.puzzle1),
        (ObjectId::PUZZLE_ITEM2, stats.puzzle2),
        (ObjectId::PUZZLE_ITEM3, stats.puzzle3),
        (ObjectId::PUZZLE_ITEM4, stats.puzzle4),
        (ObjectId::KEY_ITEM1, stats.key1),
        (ObjectId::KEY_ITEM2, stats.key2),
        (ObjectId::KEY_ITEM3, stats.key3),
        (ObjectId::KEY_ITEM4, stats.key4),
        (ObjectId::LEADBAR_ITEM, stats.leadbar),
    ];
    for (object, count) in counts {
        inventory.add_item_n_times(object, count as i32);
    }
}
