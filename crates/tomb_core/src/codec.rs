//! Fixed-width records shared by several sections of the save format.
//!
//! Every record is copied field by field in declaration order with no
//! padding, so `SIZE` is the exact number of bytes a record occupies.

use serde::{Deserialize, Serialize};

use crate::cursor::ByteCursor;
use crate::error::SaveError;

pub trait Record: Sized {
    const SIZE: usize;

    fn encode<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        c: &mut ByteCursor<B>,
    ) -> Result<(), SaveError>;

    fn decode<B: AsRef<[u8]>>(c: &mut ByteCursor<B>) -> Result<Self, SaveError>;
}

/// World position plus orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos3d {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub x_rot: i16,
    pub y_rot: i16,
    pub z_rot: i16,
}

impl Pos3d {
    /// True when any coordinate has a bit set in its top byte. No valid world
    /// position gets that far from the origin.
    pub fn is_implausible(&self) -> bool {
        (self.x.unsigned_abs() | self.y.unsigned_abs() | self.z.unsigned_abs()) & 0xFF00_0000 != 0
    }
}

impl Record for Pos3d {
    const SIZE: usize = 18;

    fn encode<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        c: &mut ByteCursor<B>,
    ) -> Result<(), SaveError> {
        c.write_i32(self.x)?;
        c.write_i32(self.y)?;
        c.write_i32(self.z)?;
        c.write_i16(self.x_rot)?;
        c.write_i16(self.y_rot)?;
        c.write_i16(self.z_rot)
    }

    fn decode<B: AsRef<[u8]>>(c: &mut ByteCursor<B>) -> Result<Self, SaveError> {
        Ok(Self {
            x: c.read_i32()?,
            y: c.read_i32()?,
            z: c.read_i32()?,
            x_rot: c.read_i16()?,
            y_rot: c.read_i16()?,
            z_rot: c.read_i16()?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Record for Vector3 {
    const SIZE: usize = 12;

    fn encode<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        c: &mut ByteCursor<B>,
    ) -> Result<(), SaveError> {
        c.write_i32(self.x)?;
        c.write_i32(self.y)?;
        c.write_i32(self.z)
    }

    fn decode<B: AsRef<[u8]>>(c: &mut ByteCursor<B>) -> Result<Self, SaveError> {
        Ok(Self {
            x: c.read_i32()?,
            y: c.read_i32()?,
            z: c.read_i32()?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoInfo {
    pub ammo: i32,
    pub hit: i32,
    pub miss: i32,
}

impl Record for AmmoInfo {
    const SIZE: usize = 12;

    fn encode<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        c: &mut ByteCursor<B>,
    ) -> Result<(), SaveError> {
        c.write_i32(self.ammo)?;
        c.write_i32(self.hit)?;
        c.write_i32(self.miss)
    }

    fn decode<B: AsRef<[u8]>>(c: &mut ByteCursor<B>) -> Result<Self, SaveError> {
        Ok(Self {
            ammo: c.read_i32()?,
            hit: c.read_i32()?,
            miss: c.read_i32()?,
        })
    }
}

/// Quest item counts carried between save and load. The last byte is unused
/// but still part of the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    pub pickup1: u8,
    pub pickup2: u8,
    pub puzzle1: u8,
    pub puzzle2: u8,
    pub puzzle3: u8,
    pub puzzle4: u8,
    pub key1: u8,
    pub key2: u8,
    pub key3: u8,
    pub key4: u8,
    pub leadbar: u8,
}

impl Record for ItemStats {
    const SIZE: usize = 12;

    fn encode<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        c: &mut ByteCursor<B>,
    ) -> Result<(), SaveError> {
        c.write_bytes(&[
            self.pickup1,
            self.pickup2,
            self.puzzle1,
            self.puzzle2,
            self.puzzle3,
            self.puzzle4,
            self.key1,
            self.key2,
            self.key3,
            self.key4,
            self.leadbar,
            0,
        ])
    }

    fn decode<B: AsRef<[u8]>>(c: &mut ByteCursor<B>) -> Result<Self, SaveError> {
        let raw = c.read_array::<12>()?;
        Ok(Self {
            pickup1: raw[0],
            pickup2: raw[1],
            puzzle1: raw[2],
            puzzle2: raw[3],
            puzzle3: raw[4],
            puzzle4: raw[5],
            key1: raw[6],
            key2: raw[7],
            key3: raw[8],
            key4: raw[9],
            leadbar: raw[10],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SkipAccounting;

    #[test]
    fn pos3d_layout_is_three_ints_then_three_shorts() {
        let pos = Pos3d {
            x: 1,
            y: -1,
            z: 0x0102_0304,
            x_rot: 5,
            y_rot: 6,
            z_rot: -7,
        };
        let mut buf = [0u8; Pos3d::SIZE];
        let mut c = ByteCursor::new(&mut buf[..], SkipAccounting::Counted);
        pos.encode(&mut c).unwrap();
        assert_eq!(c.consumed(), Pos3d::SIZE);
        assert_eq!(&buf[0..4], &[1, 0, 0, 0]);
        assert_eq!(&buf[8..12], &[4, 3, 2, 1]);
        assert_eq!(&buf[16..18], &(-7i16).to_le_bytes());
    }

    #[test]
    fn implausible_position_checks_top_byte_of_magnitude() {
        let mut pos = Pos3d {
            x: 0x00FF_FFFF,
            y: -0x00FF_FFFF,
            ..Pos3d::default()
        };
        assert!(!pos.is_implausible());
        pos.z = -0x0100_0000;
        assert!(pos.is_implausible());
        pos.z = i32::MIN;
        assert!(pos.is_implausible());
    }

    #[test]
    fn item_stats_trailing_byte_is_written_as_zero() {
        let stats = ItemStats {
            leadbar: 3,
            ..ItemStats::default()
        };
        let mut buf = [0xAAu8; ItemStats::SIZE];
        let mut c = ByteCursor::new(&mut buf[..], SkipAccounting::Counted);
        stats.encode(&mut c).unwrap();
        assert_eq!(buf[10], 3);
        assert_eq!(buf[11], 0);
    }
}
