//! The player record, the only part of the save holding table offsets.
//!
//! Meshes, arm animation frames and the active effect are table indices in
//! memory. On disk they are byte offsets from the start of the owning table,
//! translated through [`PointerTables`] in both directions.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codec::{AmmoInfo, Record, Vector3};
use crate::cursor::ByteCursor;
use crate::error::SaveError;

pub const MESH_COUNT: usize = 15;
pub const PLAYER_RECORD_LEN: usize = 236;
pub const ARM_RECORD_LEN: usize = 16;
pub const LOT_RECORD_LEN: usize = 36;

/// Box index meaning "no pathing target".
pub const NO_BOX: i16 = 0x7FF;

/// Offsets of the loaded level's tables that the player record points into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerTables {
    pub mesh_offsets: Vec<i32>,
    pub frame_offsets: Vec<i32>,
    pub effect_stride: i32,
}

impl PointerTables {
    pub fn new(mesh_offsets: Vec<i32>, frame_offsets: Vec<i32>, effect_stride: i32) -> Self {
        Self {
            mesh_offsets,
            frame_offsets,
            effect_stride,
        }
    }

    pub fn mesh_offset(&self, index: usize) -> Result<i32, SaveError> {
        self.mesh_offsets
            .get(index)
            .copied()
            .ok_or(SaveError::DanglingReference {
                table: "mesh",
                index,
            })
    }

    pub fn mesh_index(&self, offset: i32) -> Option<usize> {
        self.mesh_offsets.iter().position(|&o| o == offset)
    }

    pub fn frame_offset(&self, index: usize) -> Result<i32, SaveError> {
        self.frame_offsets
            .get(index)
            .copied()
            .ok_or(SaveError::DanglingReference {
                table: "animation frame",
                index,
            })
    }

    pub fn frame_index(&self, offset: i32) -> Option<usize> {
        self.frame_offsets.iter().position(|&o| o == offset)
    }

    pub fn effect_offset(&self, index: usize) -> i32 {
        index as i32 * self.effect_stride
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmState {
    /// Index into the animation frame table.
    pub frame_base: usize,
    pub frame_number: i16,
    pub lock: i16,
    pub y_rot: i16,
    pub x_rot: i16,
    pub z_rot: i16,
    pub flash_gun: i16,
}

/// Pathing state. `node` points into the runtime box graph and is never
/// restored from a save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotInfo {
    pub node: Option<usize>,
    pub head: i16,
    pub tail: i16,
    pub search_number: u16,
    pub block_mask: u16,
    pub step: i16,
    pub drop: i16,
    pub fly: i16,
    pub zone_count: i16,
    pub target_box: i16,
    pub required_box: i16,
    pub target: Vector3,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub item_number: i16,
    pub gun_status: i16,
    pub gun_type: i16,
    pub request_gun_type: i16,
    pub calc_fall_speed: i16,
    pub water_status: i16,
    pub pose_count: i16,
    pub hit_frame: i16,
    pub hit_direction: i16,
    pub air: i16,
    pub dive_count: i16,
    pub death_count: i16,
    pub current_active: i16,
    pub spaz_effect_count: i16,
    /// Index into the effect table; dropped on load.
    pub spaz_effect: Option<usize>,
    pub mesh_effects: i32,
    /// Indices into the mesh table.
    pub meshes: [usize; MESH_COUNT],
    /// Item being aimed at; dropped on load.
    pub target: Option<usize>,
    pub target_angles: [i16; 2],
    pub turn_rate: i16,
    pub move_angle: i16,
    pub head_y_rot: i16,
    pub head_x_rot: i16,
    pub head_z_rot: i16,
    pub torso_y_rot: i16,
    pub torso_x_rot: i16,
    pub torso_z_rot: i16,
    pub left_arm: ArmState,
    pub right_arm: ArmState,
    pub pistols: AmmoInfo,
    pub magnums: AmmoInfo,
    pub uzis: AmmoInfo,
    pub shotgun: AmmoInfo,
    pub lot: LotInfo,
}

impl PlayerState {
    fn scalars(&self) -> [i16; 14] {
        [
            self.item_number,
            self.gun_status,
            self.gun_type,
            self.request_gun_type,
            self.calc_fall_speed,
            self.water_status,
            self.pose_count,
            self.hit_frame,
            self.hit_direction,
            self.air,
            self.dive_count,
            self.death_count,
            self.current_active,
            self.spaz_effect_count,
        ]
    }

    fn scalars_mut(&mut self) -> [&mut i16; 14] {
        [
            &mut self.item_number,
            &mut self.gun_status,
            &mut self.gun_type,
            &mut self.request_gun_type,
            &mut self.calc_fall_speed,
            &mut self.water_status,
            &mut self.pose_count,
            &mut self.hit_frame,
            &mut self.hit_direction,
            &mut self.air,
            &mut self.dive_count,
            &mut self.death_count,
            &mut self.current_active,
            &mut self.spaz_effect_count,
        ]
    }

    fn angles(&self) -> [i16; 10] {
        [
            self.target_angles[0],
            self.target_angles[1],
            self.turn_rate,
            self.move_angle,
            self.head_y_rot,
            self.head_x_rot,
            self.head_z_rot,
            self.torso_y_rot,
            self.torso_x_rot,
            self.torso_z_rot,
        ]
    }

    fn angles_mut(&mut self) -> [&mut i16; 10] {
        let [target_y, target_x] = &mut self.target_angles;
        [
            target_y,
            target_x,
            &mut self.turn_rate,
            &mut self.move_angle,
            &mut self.head_y_rot,
            &mut self.head_x_rot,
            &mut self.head_z_rot,
            &mut self.torso_y_rot,
            &mut self.torso_x_rot,
            &mut self.torso_z_rot,
        ]
    }
}

pub fn write_player<B: AsRef<[u8]> + AsMut<[u8]>>(
    c: &mut ByteCursor<B>,
    player: &PlayerState,
    tables: &PointerTables,
) -> Result<(), SaveError> {
    for value in player.scalars() {
        c.write_i16(value)?;
    }

    let effect = player
        .spaz_effect
        .map_or(0, |index| tables.effect_offset(index));
    c.write_i32(effect)?;
    c.write_i32(player.mesh_effects)?;

    for &mesh in &player.meshes {
        c.write_i32(tables.mesh_offset(mesh)?)?;
    }

    // Target placeholder.
    c.write_i32(0)?;

    for value in player.angles() {
        c.write_i16(value)?;
    }

    write_arm(c, &player.left_arm, tables)?;
    write_arm(c, &player.right_arm, tables)?;
    player.pistols.encode(c)?;
    player.magnums.encode(c)?;
    player.uzis.encode(c)?;
    player.shotgun.encode(c)?;
    write_lot(c, &player.lot)
}

/// Read the player record over `player`. Runtime-only references are
/// cleared; offsets missing from `tables` leave the live index untouched.
pub fn read_player<B: AsRef<[u8]>>(
    c: &mut ByteCursor<B>,
    player: &mut PlayerState,
    tables: &PointerTables,
) -> Result<(), SaveError> {
    for value in player.scalars_mut() {
        *value = c.read_i16()?;
    }

    player.spaz_effect = None;
    c.skip(4);
    player.mesh_effects = c.read_i32()?;

    for (slot, mesh) in player.meshes.iter_mut().enumerate() {
        let offset = c.read_i32()?;
        match tables.mesh_index(offset) {
            Some(index) => *mesh = index,
            None => warn!(slot, offset, "mesh offset not in the level's mesh table"),
        }
    }

    player.target = None;
    c.skip(4);

    for value in player.angles_mut() {
        *value = c.read_i16()?;
    }

    read_arm(c, &mut player.left_arm, tables)?;
    read_arm(c, &mut player.right_arm, tables)?;
    player.pistols = AmmoInfo::decode(c)?;
    player.magnums = AmmoInfo::decode(c)?;
    player.uzis = AmmoInfo::decode(c)?;
    player.shotgun = AmmoInfo::decode(c)?;
    read_lot(c, &mut player.lot)
}

fn write_arm<B: AsRef<[u8]> + AsMut<[u8]>>(
    c: &mut ByteCursor<B>,
    arm: &ArmState,
    tables: &PointerTables,
) -> Result<(), SaveError> {
    c.write_i32(tables.frame_offset(arm.frame_base)?)?;
    c.write_i16(arm.frame_number)?;
    c.write_i16(arm.lock)?;
    c.write_i16(arm.y_rot)?;
    c.write_i16(arm.x_rot)?;
    c.write_i16(arm.z_rot)?;
    c.write_i16(arm.flash_gun)
}

fn read_arm<B: AsRef<[u8]>>(
    c: &mut ByteCursor<B>,
    arm: &mut ArmState,
    tables: &PointerTables,
) -> Result<(), SaveError> {
    let offset = c.read_i32()?;
    match tables.frame_index(offset) {
        Some(index) => arm.frame_base = index,
        None => warn!(offset, "arm frame offset not in the level's frame table"),
    }
    arm.frame_number = c.read_i16()?;
    arm.lock = c.read_i16()?;
    arm.y_rot = c.read_i16()?;
    arm.x_rot = c.read_i16()?;
    arm.z_rot = c.read_i16()?;
    arm.flash_gun = c.read_i16()?;
    Ok(())
}

fn write_lot<B: AsRef<[u8]> + AsMut<[u8]>>(
    c: &mut ByteCursor<B>,
    lot: &LotInfo,
) -> Result<(), SaveError> {
    // The node is a runtime reference; its slot is kept for layout only.
    c.write_i32(0)?;
    c.write_i16(lot.head)?;
    c.write_i16(lot.tail)?;
    c.write_u16(lot.search_number)?;
    c.write_u16(lot.block_mask)?;
    c.write_i16(lot.step)?;
    c.write_i16(lot.drop)?;
    c.write_i16(lot.fly)?;
    c.write_i16(lot.zone_count)?;
    c.write_i16(lot.target_box)?;
    c.write_i16(lot.required_box)?;
    lot.target.encode(c)
}

fn read_lot<B: AsRef<[u8]>>(c: &mut ByteCursor<B>, lot: &mut LotInfo) -> Result<(), SaveError> {
    lot.node = None;
    c.skip(4);
    lot.head = c.read_i16()?;
    lot.tail = c.read_i16()?;
    lot.search_number = c.read_u16()?;
    lot.block_mask = c.read_u16()?;
    lot.step = c.read_i16()?;
    lot.drop = c.read_i16()?;
    lot.fly = c.read_i16()?;
    lot.zone_count = c.read_i16()?;
    lot.target_box = c.read_i16()?;
    lot.required_box = c.read_i16()?;
    lot.target = Vector3::decode(c)?;
    Ok(())
}
