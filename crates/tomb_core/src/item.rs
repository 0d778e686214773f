use serde::{Deserialize, Serialize};

use crate::codec::Pos3d;
use crate::object::ObjectId;

pub const IF_ONESHOT: u16 = 0x0100;
pub const IF_CODE_BITS: u16 = 0x3E00;
pub const IF_REVERSE: u16 = 0x4000;
pub const IF_KILLED_ITEM: u16 = 0x8000;

/// Mesh bits a deactivated pod is left with.
pub const POD_OPEN_MESH_BITS: u32 = 0x1FF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    NotActive,
    Active,
    Deactivated,
    Invisible,
}

impl ItemStatus {
    pub fn from_bits(bits: u16) -> Self {
        match bits & 3 {
            0 => Self::NotActive,
            1 => Self::Active,
            2 => Self::Deactivated,
            _ => Self::Invisible,
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            Self::NotActive => 0,
            Self::Active => 1,
            Self::Deactivated => 2,
            Self::Invisible => 3,
        }
    }
}

/// AI state of an item that is currently thinking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreatureInfo {
    pub head_rotation: i16,
    pub neck_rotation: i16,
    pub maximum_turn: i16,
    pub flags: i16,
    pub mood: i32,
}

/// One live item of the loaded level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Item {
    pub object_id: ObjectId,
    pub room_number: i16,
    pub pos: Pos3d,
    pub speed: i16,
    pub fall_speed: i16,
    pub current_anim_state: i16,
    pub goal_anim_state: i16,
    pub required_anim_state: i16,
    pub anim_number: i16,
    pub frame_number: i16,
    pub hit_points: i16,
    /// Trigger flags. Only the high byte survives a load; the low byte is
    /// used as scratch space for the packed state bits.
    pub flags: u16,
    pub timer: i16,
    pub active: bool,
    pub status: ItemStatus,
    pub gravity_status: bool,
    pub collidable: bool,
    pub mesh_bits: u32,
    pub floor: i32,
    pub creature: Option<CreatureInfo>,
}

impl Item {
    pub fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            collidable: true,
            mesh_bits: u32::MAX,
            ..Self::default()
        }
    }
}
