//! Per-item field groups selected by the object's [`SaveFlags`].
//!
//! Groups are always visited in the same order: position, anim, hitpoints,
//! flags. The flags group carries a creature sub-record whose presence is
//! encoded as bit 7 of the flags word itself.

use tracing::debug;

use crate::codec::{Pos3d, Record};
use crate::cursor::ByteCursor;
use crate::error::SaveError;
use crate::hooks::{Inventory, LevelHooks, MusicTrack};
use crate::item::{
    CreatureInfo, IF_KILLED_ITEM, IF_ONESHOT, Item, ItemStatus, POD_OPEN_MESH_BITS,
};
use crate::object::{Behaviour, ObjectId, ObjectInfo, SaveFlags};

pub const POSITION_BLOCK_LEN: usize = Pos3d::SIZE + 6;
pub const ANIM_BLOCK_LEN: usize = 10;
pub const HITPOINTS_BLOCK_LEN: usize = 2;
pub const FLAGS_BLOCK_LEN: usize = 4;
pub const CREATURE_RECORD_LEN: usize = 12;

/// One block of floor height, in world units.
pub const WALL_L: i32 = 1024;

/// Animation state of a rolling block that is still travelling.
pub const ROLLING_BLOCK_MOVING: i16 = 1;

impl Record for CreatureInfo {
    const SIZE: usize = CREATURE_RECORD_LEN;

    fn encode<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        c: &mut ByteCursor<B>,
    ) -> Result<(), SaveError> {
        c.write_i16(self.head_rotation)?;
        c.write_i16(self.neck_rotation)?;
        c.write_i16(self.maximum_turn)?;
        c.write_i16(self.flags)?;
        c.write_i32(self.mood)
    }

    fn decode<B: AsRef<[u8]>>(c: &mut ByteCursor<B>) -> Result<Self, SaveError> {
        Ok(Self {
            head_rotation: c.read_i16()?,
            neck_rotation: c.read_i16()?,
            maximum_turn: c.read_i16()?,
            flags: c.read_i16()?,
            mood: c.read_i32()?,
        })
    }
}

/// The saved flags word: trigger bits in the high byte, packed item state in
/// the low byte, with bit 7 reserved for the creature sub-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagsWord(pub u16);

impl FlagsWord {
    pub const ACTIVE: u16 = 0x0001;
    pub const STATUS_MASK: u16 = 0x0006;
    pub const GRAVITY: u16 = 0x0008;
    pub const COLLIDABLE: u16 = 0x0010;
    pub const CREATURE: u16 = 0x0080;
    pub const TRIGGER_MASK: u16 = 0xFF00;

    pub fn pack(item: &Item, with_creature: bool) -> Self {
        let mut word = item.flags & Self::TRIGGER_MASK;
        if item.active {
            word |= Self::ACTIVE;
        }
        word |= item.status.bits() << 1;
        if item.gravity_status {
            word |= Self::GRAVITY;
        }
        if item.collidable {
            word |= Self::COLLIDABLE;
        }
        if with_creature {
            word |= Self::CREATURE;
        }
        Self(word)
    }

    pub fn payload(self) -> u16 {
        self.0 & !Self::CREATURE
    }

    pub fn has_creature(self) -> bool {
        self.0 & Self::CREATURE != 0
    }

    pub fn is_killed(self) -> bool {
        self.0 & IF_KILLED_ITEM != 0
    }

    pub fn active(self) -> bool {
        self.0 & Self::ACTIVE != 0
    }

    pub fn status(self) -> ItemStatus {
        ItemStatus::from_bits((self.0 & Self::STATUS_MASK) >> 1)
    }

    pub fn gravity(self) -> bool {
        self.0 & Self::GRAVITY != 0
    }

    pub fn collidable(self) -> bool {
        self.0 & Self::COLLIDABLE != 0
    }

    pub fn trigger_bits(self) -> u16 {
        self.0 & Self::TRIGGER_MASK
    }
}

/// Bytes `item` occupies in a save, creature sub-record included.
pub fn encoded_len(item: &Item, info: &ObjectInfo) -> usize {
    let mut len = info.saved_len();
    if info.save.contains(SaveFlags::FLAGS) && carries_creature(item, info) {
        len += CREATURE_RECORD_LEN;
    }
    len
}

fn carries_creature(item: &Item, info: &ObjectInfo) -> bool {
    info.intelligent && item.creature.is_some()
}

pub fn write_item<B: AsRef<[u8]> + AsMut<[u8]>>(
    c: &mut ByteCursor<B>,
    item: &Item,
    info: &ObjectInfo,
) -> Result<(), SaveError> {
    if info.save.contains(SaveFlags::POSITION) {
        item.pos.encode(c)?;
        c.write_i16(item.room_number)?;
        c.write_i16(item.speed)?;
        c.write_i16(item.fall_speed)?;
    }

    if info.save.contains(SaveFlags::ANIM) {
        c.write_i16(item.current_anim_state)?;
        c.write_i16(item.goal_anim_state)?;
        c.write_i16(item.required_anim_state)?;
        c.write_i16(item.anim_number)?;
        c.write_i16(item.frame_number)?;
    }

    if info.save.contains(SaveFlags::HITPOINTS) {
        c.write_i16(item.hit_points)?;
    }

    if info.save.contains(SaveFlags::FLAGS) {
        let creature = item.creature.filter(|_| info.intelligent);
        let word = FlagsWord::pack(item, creature.is_some());
        c.write_u16(word.0)?;
        c.write_i16(item.timer)?;
        if let Some(creature) = creature {
            creature.encode(c)?;
        }
    }

    Ok(())
}

/// Collaborators and switches for restoring items from a save.
pub struct ApplyContext<'a> {
    pub hooks: &'a mut dyn LevelHooks,
    pub inventory: &'a dyn Inventory,
    /// The save was written by an engine that never persisted the
    /// doppelganger's flags group.
    pub skip_doppelganger_flags: bool,
}

/// Read the saved groups of item `index` into the live item and run the
/// per-object reactions to the restored state.
pub fn apply_item<B: AsRef<[u8]>>(
    c: &mut ByteCursor<B>,
    index: usize,
    item: &mut Item,
    info: &ObjectInfo,
    ctx: &mut ApplyContext<'_>,
) -> Result<(), SaveError> {
    match info.behaviour {
        Behaviour::MovableBlock => ctx.hooks.alter_floor_height(item, WALL_L),
        Behaviour::RollingBlock => ctx.hooks.alter_floor_height(item, WALL_L * 2),
        _ => {}
    }

    if info.save.contains(SaveFlags::POSITION) {
        item.pos = Pos3d::decode(c)?;
        let room = c.read_i16()?;
        item.speed = c.read_i16()?;
        item.fall_speed = c.read_i16()?;

        if item.room_number != room {
            ctx.hooks.item_new_room(index, item, room);
        }

        if info.shadow_size != 0 {
            if let Some(floor) = ctx.hooks.floor_height(item) {
                item.floor = floor;
            }
        }
    }

    if info.save.contains(SaveFlags::ANIM) {
        item.current_anim_state = c.read_i16()?;
        item.goal_anim_state = c.read_i16()?;
        item.required_anim_state = c.read_i16()?;
        item.anim_number = c.read_i16()?;
        item.frame_number = c.read_i16()?;
    }

    if info.save.contains(SaveFlags::HITPOINTS) {
        item.hit_points = c.read_i16()?;
    }

    let skip_flags =
        item.object_id == ObjectId::DOPPELGANGER && ctx.skip_doppelganger_flags;
    if info.save.contains(SaveFlags::FLAGS) && !skip_flags {
        apply_flags(c, index, item, info, ctx)?;
    }

    match info.behaviour {
        Behaviour::MovableBlock if item.status == ItemStatus::NotActive => {
            ctx.hooks.alter_floor_height(item, -WALL_L);
        }
        Behaviour::RollingBlock if item.current_anim_state != ROLLING_BLOCK_MOVING => {
            ctx.hooks.alter_floor_height(item, -WALL_L * 2);
        }
        _ => {}
    }

    respawn_boss_drops(item, ctx);
    Ok(())
}

fn apply_flags<B: AsRef<[u8]>>(
    c: &mut ByteCursor<B>,
    index: usize,
    item: &mut Item,
    info: &ObjectInfo,
    ctx: &mut ApplyContext<'_>,
) -> Result<(), SaveError> {
    let word = FlagsWord(c.read_u16()?);
    item.flags = word.payload();
    item.timer = c.read_i16()?;

    if word.is_killed() {
        ctx.hooks.kill_item(index, item);
        item.status = ItemStatus::Deactivated;
    } else {
        if word.active() && !item.active {
            ctx.hooks.add_active_item(index, item);
        }
        item.status = word.status();
        if word.gravity() {
            item.gravity_status = true;
        }
        if !word.collidable() {
            item.collidable = false;
        }
    }

    if word.has_creature() {
        ctx.hooks.enable_creature_ai(index, item);
        match item.creature.as_mut() {
            Some(creature) => *creature = CreatureInfo::decode(c)?,
            None => {
                debug!(index, "no creature slot free, skipping saved AI state");
                c.skip(CREATURE_RECORD_LEN);
            }
        }
    } else if info.intelligent {
        item.creature = None;
    }

    item.flags = word.trigger_bits();

    match info.behaviour {
        Behaviour::PuzzleHole
            if matches!(item.status, ItemStatus::Active | ItemStatus::Deactivated) =>
        {
            item.object_id = item.object_id.solved_puzzle();
        }
        Behaviour::Pod if item.status == ItemStatus::Deactivated => {
            item.mesh_bits = POD_OPEN_MESH_BITS;
            item.collidable = false;
        }
        Behaviour::Pickup if item.status == ItemStatus::Deactivated => {
            ctx.hooks.remove_drawn_item(index, item);
        }
        _ => {}
    }

    Ok(())
}

// Defeated bosses drop weapons and keys the player has not picked up yet, and
// their speeches must not replay.
fn respawn_boss_drops(item: &Item, ctx: &mut ApplyContext<'_>) {
    if item.hit_points > 0 {
        return;
    }

    match item.object_id {
        ObjectId::PIERRE if item.flags & IF_ONESHOT != 0 => {
            if ctx.inventory.request_item(ObjectId::SCION_ITEM) == 1 {
                ctx.hooks.spawn_item(item, ObjectId::MAGNUM_ITEM);
                ctx.hooks.spawn_item(item, ObjectId::SCION_ITEM2);
                ctx.hooks.spawn_item(item, ObjectId::KEY_ITEM1);
            }
            ctx.hooks.mark_track_played(MusicTrack::PierreSpeech);
        }
        ObjectId::MERCENARY1 => {
            spawn_if_missing(item, ObjectId::UZI_ITEM, ctx);
        }
        ObjectId::MERCENARY2 => {
            spawn_if_missing(item, ObjectId::MAGNUM_ITEM, ctx);
            ctx.hooks.mark_track_played(MusicTrack::CowboySpeech);
        }
        ObjectId::MERCENARY3 => {
            spawn_if_missing(item, ObjectId::SHOTGUN_ITEM, ctx);
            ctx.hooks.mark_track_played(MusicTrack::BaldySpeech);
        }
        ObjectId::LARSON => {
            ctx.hooks.mark_track_played(MusicTrack::BaldySpeech);
        }
        _ => {}
    }
}

fn spawn_if_missing(item: &Item, weapon: ObjectId, ctx: &mut ApplyContext<'_>) {
    if ctx.inventory.request_item(weapon) == 0 {
        ctx.hooks.spawn_item(item, weapon);
    }
}

/// Walk the saved groups of one item without touching live state. Only the
/// position is kept, in `scratch`; items that save no position leave it as
/// it was.
pub fn skim_item<B: AsRef<[u8]>>(
    c: &mut ByteCursor<B>,
    info: &ObjectInfo,
    scratch: &mut Pos3d,
) -> Result<(), SaveError> {
    if info.save.contains(SaveFlags::POSITION) {
        *scratch = Pos3d::decode(c)?;
        c.skip(2);
        c.read_i16()?;
        c.read_i16()?;
    }
    if info.save.contains(SaveFlags::ANIM) {
        c.read_bytes(ANIM_BLOCK_LEN)?;
    }
    if info.save.contains(SaveFlags::HITPOINTS) {
        c.read_i16()?;
    }
    if info.save.contains(SaveFlags::FLAGS) {
        let word = FlagsWord(c.read_u16()?);
        c.read_i16()?;
        if word.has_creature() {
            CreatureInfo::decode(c)?;
        }
    }
    Ok(())
}
