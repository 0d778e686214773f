//! Per-level loadout carried from one level to the next.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::codec::Record;
use crate::cursor::ByteCursor;
use crate::error::SaveError;
use crate::gameflow::GameFlow;
use crate::hooks::Inventory;
use crate::object::ObjectId;
use crate::player::PlayerState;

pub const GUN_UNARMED: i8 = 0;
pub const GUN_PISTOLS: i8 = 1;
pub const GUN_MAGNUMS: i8 = 2;
pub const GUN_UZIS: i8 = 3;
pub const GUN_SHOTGUN: i8 = 4;

pub const GUN_STATUS_ARMLESS: i8 = 0;
pub const GUN_STATUS_READY: i8 = 4;

pub const DEFAULT_PISTOL_AMMO: u16 = 1000;
pub const BONUS_AMMO: u16 = 1234;
pub const SHOTGUN_AMMO_QTY: i32 = 12;
pub const MAGNUM_AMMO_QTY: i32 = 50;
pub const UZI_AMMO_QTY: i32 = 100;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StartFlags: u16 {
        const AVAILABLE = 1 << 0;
        const GOT_PISTOLS = 1 << 1;
        const GOT_MAGNUMS = 1 << 2;
        const GOT_UZIS = 1 << 3;
        const GOT_SHOTGUN = 1 << 4;
        const COSTUME = 1 << 5;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct BonusFlags: u8 {
        const NG_PLUS = 1 << 0;
        const JAPANESE = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartInfo {
    pub pistol_ammo: u16,
    pub magnum_ammo: u16,
    pub uzi_ammo: u16,
    pub shotgun_ammo: u16,
    pub num_medis: u8,
    pub num_big_medis: u8,
    pub num_scions: u8,
    pub gun_status: i8,
    pub gun_type: i8,
    pub flags: StartFlags,
}

impl Record for StartInfo {
    const SIZE: usize = 15;

    fn encode<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        c: &mut ByteCursor<B>,
    ) -> Result<(), SaveError> {
        c.write_u16(self.pistol_ammo)?;
        c.write_u16(self.magnum_ammo)?;
        c.write_u16(self.uzi_ammo)?;
        c.write_u16(self.shotgun_ammo)?;
        c.write_u8(self.num_medis)?;
        c.write_u8(self.num_big_medis)?;
        c.write_u8(self.num_scions)?;
        c.write_i8(self.gun_status)?;
        c.write_i8(self.gun_type)?;
        // Unknown bits are kept so the word round-trips untouched.
        c.write_u16(self.flags.bits())
    }

    fn decode<B: AsRef<[u8]>>(c: &mut ByteCursor<B>) -> Result<Self, SaveError> {
        Ok(Self {
            pistol_ammo: c.read_u16()?,
            magnum_ammo: c.read_u16()?,
            uzi_ammo: c.read_u16()?,
            shotgun_ammo: c.read_u16()?,
            num_medis: c.read_u8()?,
            num_big_medis: c.read_u8()?,
            num_scions: c.read_u8()?,
            gun_status: c.read_i8()?,
            gun_type: c.read_i8()?,
            flags: StartFlags::from_bits_retain(c.read_u16()?),
        })
    }
}

pub fn write_table<B: AsRef<[u8]> + AsMut<[u8]>>(
    c: &mut ByteCursor<B>,
    table: &[StartInfo],
) -> Result<(), SaveError> {
    for start in table {
        start.encode(c)?;
    }
    Ok(())
}

pub fn read_table<B: AsRef<[u8]>>(
    c: &mut ByteCursor<B>,
    table: &mut [StartInfo],
) -> Result<(), SaveError> {
    for start in table.iter_mut() {
        *start = StartInfo::decode(c)?;
    }
    Ok(())
}

pub fn skip_table<B: AsRef<[u8]>>(c: &mut ByteCursor<B>, level_count: usize) {
    c.skip(level_count * StartInfo::SIZE);
}

/// Reset every level to its new-game loadout.
pub fn initialise_start_info(table: &mut [StartInfo], flow: &GameFlow, bonus: BonusFlags) {
    for level in 0..table.len() {
        modify_start_info(table, level, flow, bonus);
        table[level].flags.remove(StartFlags::AVAILABLE);
    }
    for level in [flow.gym_level, Some(flow.first_level)].into_iter().flatten() {
        if let Some(start) = table.get_mut(level) {
            start.flags.insert(StartFlags::AVAILABLE);
        }
    }
}

pub fn modify_start_info(
    table: &mut [StartInfo],
    level: usize,
    flow: &GameFlow,
    bonus: BonusFlags,
) {
    let Some(start) = table.get_mut(level) else {
        return;
    };

    start.flags.insert(StartFlags::GOT_PISTOLS);
    start.gun_type = GUN_PISTOLS;
    start.pistol_ammo = DEFAULT_PISTOL_AMMO;

    let is_gym = flow.gym_level == Some(level);
    if is_gym {
        start.flags.insert(StartFlags::AVAILABLE | StartFlags::COSTUME);
        start.num_medis = 0;
        start.num_big_medis = 0;
        start.num_scions = 0;
        start.pistol_ammo = 0;
        start.shotgun_ammo = 0;
        start.magnum_ammo = 0;
        start.uzi_ammo = 0;
        start.flags.remove(
            StartFlags::GOT_PISTOLS
                | StartFlags::GOT_SHOTGUN
                | StartFlags::GOT_MAGNUMS
                | StartFlags::GOT_UZIS,
        );
        start.gun_type = GUN_UNARMED;
        start.gun_status = GUN_STATUS_ARMLESS;
    }

    if level == flow.first_level {
        start.flags.insert(StartFlags::AVAILABLE);
        start.flags.remove(StartFlags::COSTUME);
        start.num_medis = 0;
        start.num_big_medis = 0;
        start.num_scions = 0;
        start.shotgun_ammo = 0;
        start.magnum_ammo = 0;
        start.uzi_ammo = 0;
        start
            .flags
            .remove(StartFlags::GOT_SHOTGUN | StartFlags::GOT_MAGNUMS | StartFlags::GOT_UZIS);
        start.gun_status = GUN_STATUS_ARMLESS;
    }

    if bonus.contains(BonusFlags::NG_PLUS) && !is_gym {
        start.flags.insert(
            StartFlags::GOT_PISTOLS
                | StartFlags::GOT_SHOTGUN
                | StartFlags::GOT_MAGNUMS
                | StartFlags::GOT_UZIS,
        );
        start.shotgun_ammo = BONUS_AMMO;
        start.magnum_ammo = BONUS_AMMO;
        start.uzi_ammo = BONUS_AMMO;
        start.gun_type = GUN_UZIS;
    }
}

/// Snapshot the player's current loadout as the start info of `level`.
pub fn create_start_info(start: &mut StartInfo, inventory: &dyn Inventory, player: &PlayerState) {
    start.flags.insert(StartFlags::AVAILABLE);
    start.flags.remove(StartFlags::COSTUME);

    start.pistol_ammo = DEFAULT_PISTOL_AMMO;
    start
        .flags
        .set(StartFlags::GOT_PISTOLS, inventory.request_item(ObjectId::PISTOL_ITEM) != 0);

    let (ammo, got) = weapon_ammo(
        inventory,
        ObjectId::MAGNUM_ITEM,
        player.magnums.ammo,
        ObjectId::MAGNUM_AMMO_ITEM,
        MAGNUM_AMMO_QTY,
    );
    start.magnum_ammo = ammo;
    start.flags.set(StartFlags::GOT_MAGNUMS, got);

    let (ammo, got) = weapon_ammo(
        inventory,
        ObjectId::UZI_ITEM,
        player.uzis.ammo,
        ObjectId::UZI_AMMO_ITEM,
        UZI_AMMO_QTY,
    );
    start.uzi_ammo = ammo;
    start.flags.set(StartFlags::GOT_UZIS, got);

    let (ammo, got) = weapon_ammo(
        inventory,
        ObjectId::SHOTGUN_ITEM,
        player.shotgun.ammo,
        ObjectId::SHOTGUN_AMMO_ITEM,
        SHOTGUN_AMMO_QTY,
    );
    start.shotgun_ammo = ammo;
    start.flags.set(StartFlags::GOT_SHOTGUN, got);

    start.num_medis = inventory.request_item(ObjectId::MEDI_ITEM) as u8;
    start.num_big_medis = inventory.request_item(ObjectId::BIGMEDI_ITEM) as u8;
    start.num_scions = inventory.request_item(ObjectId::SCION_ITEM) as u8;

    start.gun_type = player.gun_type as i8;
    start.gun_status = if player.gun_status == GUN_STATUS_READY as i16 {
        GUN_STATUS_READY
    } else {
        GUN_STATUS_ARMLESS
    };
}

// Ammo of a carried weapon comes from the weapon itself, otherwise from loose
// clips in the inventory.
fn weapon_ammo(
    inventory: &dyn Inventory,
    weapon: ObjectId,
    loaded: i32,
    clip: ObjectId,
    per_clip: i32,
) -> (u16, bool) {
    if inventory.request_item(weapon) != 0 {
        (loaded as u16, true)
    } else {
        // Clip totals past the u16 range truncate.
        (inventory.request_item(clip).wrapping_mul(per_clip) as u16, false)
    }
}
