//! Detection of saves written before the doppelganger's flags were persisted.
//!
//! Older engines did not save the flags group of the doppelganger, so on the
//! one level where it appears their saves are four bytes shorter per such
//! item. Nothing in the file says which engine wrote it. Decoding the item
//! list with the current schema and looking at the positions is the only
//! evidence: a misaligned read lands in the middle of other fields and yields
//! coordinates far outside any real level.

use crate::codec::{ItemStats, Pos3d, Record};
use crate::cursor::ByteCursor;
use crate::error::SaveError;
use crate::schema::skim_item;
use crate::session::{GameSession, MAX_FLIP_MAPS, TITLE_SIZE};
use crate::start_info::skip_table;

/// The only level whose saves can be affected.
pub const LEGACY_LEVEL: u16 = 14;

/// Size of the aggregate scalars: timer, kills, secrets, level, pickups and
/// bonus flags.
const AGGREGATE_LEN: usize = 4 + 4 + 2 + 2 + 1 + 1;

impl GameSession {
    /// Guess whether the save buffer predates persisted doppelganger flags.
    ///
    /// Reads the buffer without touching any live state. A false answer is
    /// also the result when the dry run runs off the end of the buffer before
    /// finding anything implausible.
    pub fn needs_doppelganger_fix(&self) -> bool {
        if self.current_level != LEGACY_LEVEL {
            return false;
        }
        let mut found = false;
        // A truncated buffer keeps whatever was seen before the end.
        let _ = self.scan_positions(&mut found);
        found
    }

    fn scan_positions(&self, found: &mut bool) -> Result<(), SaveError> {
        let mut c = ByteCursor::new(&self.buffer[..], self.flow.save.skip_accounting);
        c.skip(TITLE_SIZE);
        c.skip(4);
        skip_table(&mut c, self.flow.level_count());
        c.skip(AGGREGATE_LEN);
        c.skip(ItemStats::SIZE);
        c.skip(4);
        c.skip(MAX_FLIP_MAPS);
        c.skip(self.level.cameras.len() * 2);

        let mut scratch = Pos3d::default();
        for item in &self.level.items {
            skim_item(&mut c, self.level.objects.get(item.object_id), &mut scratch)?;
            if scratch.is_implausible() {
                *found = true;
            }
        }
        Ok(())
    }
}
