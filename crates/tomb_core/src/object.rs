use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Index into the level's object table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ObjectId(pub u16);

impl ObjectId {
    pub const PLAYER: Self = Self(0);
    pub const DOPPELGANGER: Self = Self(6);
    pub const LARSON: Self = Self(27);
    pub const PIERRE: Self = Self(28);
    pub const MERCENARY1: Self = Self(30);
    pub const MERCENARY2: Self = Self(31);
    pub const MERCENARY3: Self = Self(32);

    pub const PISTOL_ITEM: Self = Self(84);
    pub const SHOTGUN_ITEM: Self = Self(85);
    pub const MAGNUM_ITEM: Self = Self(86);
    pub const UZI_ITEM: Self = Self(87);
    pub const SHOTGUN_AMMO_ITEM: Self = Self(89);
    pub const MAGNUM_AMMO_ITEM: Self = Self(90);
    pub const UZI_AMMO_ITEM: Self = Self(91);
    pub const MEDI_ITEM: Self = Self(93);
    pub const BIGMEDI_ITEM: Self = Self(94);

    pub const PUZZLE_ITEM1: Self = Self(110);
    pub const PUZZLE_ITEM2: Self = Self(111);
    pub const PUZZLE_ITEM3: Self = Self(112);
    pub const PUZZLE_ITEM4: Self = Self(113);
    pub const PUZZLE_HOLE1: Self = Self(118);
    pub const PUZZLE_DONE1: Self = Self(122);
    pub const LEADBAR_ITEM: Self = Self(126);
    pub const KEY_ITEM1: Self = Self(129);
    pub const KEY_ITEM2: Self = Self(130);
    pub const KEY_ITEM3: Self = Self(131);
    pub const KEY_ITEM4: Self = Self(132);
    pub const PICKUP_ITEM1: Self = Self(141);
    pub const PICKUP_ITEM2: Self = Self(142);
    pub const SCION_ITEM: Self = Self(143);
    pub const SCION_ITEM2: Self = Self(144);

    /// Object a solved puzzle hole turns into.
    pub fn solved_puzzle(self) -> Self {
        Self(self.0 + (Self::PUZZLE_DONE1.0 - Self::PUZZLE_HOLE1.0))
    }
}

bitflags! {
    /// Which field groups of an item are persisted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SaveFlags: u8 {
        const POSITION = 1 << 0;
        const ANIM = 1 << 1;
        const HITPOINTS = 1 << 2;
        const FLAGS = 1 << 3;
    }
}

/// Behaviour class of an object, as far as loading cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behaviour {
    #[default]
    Plain,
    MovableBlock,
    RollingBlock,
    Pod,
    PuzzleHole,
    Pickup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub save: SaveFlags,
    pub intelligent: bool,
    pub shadow_size: i16,
    pub behaviour: Behaviour,
}

impl ObjectInfo {
    pub const INERT: Self = Self {
        save: SaveFlags::empty(),
        intelligent: false,
        shadow_size: 0,
        behaviour: Behaviour::Plain,
    };

    pub fn new(save: SaveFlags) -> Self {
        Self {
            save,
            ..Self::INERT
        }
    }

    pub fn intelligent(mut self) -> Self {
        self.intelligent = true;
        self
    }

    pub fn with_shadow(mut self, size: i16) -> Self {
        self.shadow_size = size;
        self
    }

    pub fn with_behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    /// Bytes an item of this object occupies in the save, excluding the
    /// optional creature sub-record.
    pub fn saved_len(&self) -> usize {
        let mut len = 0;
        if self.save.contains(SaveFlags::POSITION) {
            len += crate::schema::POSITION_BLOCK_LEN;
        }
        if self.save.contains(SaveFlags::ANIM) {
            len += crate::schema::ANIM_BLOCK_LEN;
        }
        if self.save.contains(SaveFlags::HITPOINTS) {
            len += crate::schema::HITPOINTS_BLOCK_LEN;
        }
        if self.save.contains(SaveFlags::FLAGS) {
            len += crate::schema::FLAGS_BLOCK_LEN;
        }
        len
    }
}

/// Object descriptors of the loaded level, indexed by [`ObjectId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTable {
    entries: Vec<ObjectInfo>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: ObjectId, info: ObjectInfo) {
        let index = id.0 as usize;
        if self.entries.len() <= index {
            self.entries.resize(index + 1, ObjectInfo::INERT);
        }
        self.entries[index] = info;
    }

    /// Descriptor for `id`; ids the level never set up are inert.
    pub fn get(&self, id: ObjectId) -> &ObjectInfo {
        self.entries.get(id.0 as usize).unwrap_or(&ObjectInfo::INERT)
    }
}
