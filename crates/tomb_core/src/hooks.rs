//! Interfaces to the rest of the engine.
//!
//! Loading only restores bytes. Whatever the game does in reaction to a
//! restored value goes through these traits, implemented by the level and
//! inventory code of the host.

use std::collections::BTreeMap;

use crate::item::{CreatureInfo, Item};
use crate::object::ObjectId;
use crate::start_info::{StartFlags, StartInfo};

/// One-shot speech tracks that defeated bosses have already played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicTrack {
    PierreSpeech,
    CowboySpeech,
    BaldySpeech,
}

pub trait Inventory {
    fn request_item(&self, object: ObjectId) -> i32;

    fn add_item_n_times(&mut self, object: ObjectId, count: i32);

    /// Give the player the loadout of `level` before quest items are added
    /// back from a save.
    fn reset_for_level(&mut self, level: u16, start: &StartInfo);
}

/// Level side effects triggered while applying a save. Defaults keep the
/// item state consistent without touching any level geometry.
pub trait LevelHooks {
    fn flip_map(&mut self) {}

    fn item_new_room(&mut self, _index: usize, item: &mut Item, room: i16) {
        item.room_number = room;
    }

    /// Floor height under a shadow casting item, when the host can compute it.
    fn floor_height(&mut self, _item: &Item) -> Option<i32> {
        None
    }

    fn alter_floor_height(&mut self, _item: &Item, _delta: i32) {}

    fn kill_item(&mut self, _index: usize, item: &mut Item) {
        item.active = false;
    }

    fn add_active_item(&mut self, _index: usize, item: &mut Item) {
        item.active = true;
    }

    /// Allocate AI state for `item`. Hosts with a bounded creature pool may
    /// leave `item.creature` empty.
    fn enable_creature_ai(&mut self, _index: usize, item: &mut Item) {
        if item.creature.is_none() {
            item.creature = Some(CreatureInfo::default());
        }
    }

    fn remove_drawn_item(&mut self, _index: usize, _item: &mut Item) {}

    fn spawn_item(&mut self, _source: &Item, _object: ObjectId) {}

    fn mark_track_played(&mut self, _track: MusicTrack) {}
}

/// Hooks with nothing but the default behaviour.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl LevelHooks for NoopHooks {}

/// Inventory that only tracks counts per object.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CountedInventory {
    counts: BTreeMap<ObjectId, i32>,
}

impl CountedInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, object: ObjectId, count: i32) -> Self {
        self.add_item_n_times(object, count);
        self
    }

    pub fn counts(&self) -> &BTreeMap<ObjectId, i32> {
        &self.counts
    }
}

impl Inventory for CountedInventory {
    fn request_item(&self, object: ObjectId) -> i32 {
        self.counts.get(&object).copied().unwrap_or(0)
    }

    fn add_item_n_times(&mut self, object: ObjectId, count: i32) {
        if count <= 0 {
            return;
        }
        *self.counts.entry(object).or_insert(0) += count;
    }

    fn reset_for_level(&mut self, _level: u16, start: &StartInfo) {
        self.counts.clear();
        let weapons = [
            (StartFlags::GOT_PISTOLS, ObjectId::PISTOL_ITEM),
            (StartFlags::GOT_MAGNUMS, ObjectId::MAGNUM_ITEM),
            (StartFlags::GOT_UZIS, ObjectId::UZI_ITEM),
            (StartFlags::GOT_SHOTGUN, ObjectId::SHOTGUN_ITEM),
        ];
        for (flag, object) in weapons {
            if start.flags.contains(flag) {
                self.add_item_n_times(object, 1);
            }
        }
        self.add_item_n_times(ObjectId::MEDI_ITEM, start.num_medis as i32);
        self.add_item_n_times(ObjectId::BIGMEDI_ITEM, start.num_big_medis as i32);
        self.add_item_n_times(ObjectId::SCION_ITEM, start.num_scions as i32);
    }
}
