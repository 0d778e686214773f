use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub text: String,
    /// Empty slots cannot be picked for loading.
    pub blocked: bool,
}

/// The load/save requester: one line per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotList {
    pub entries: Vec<SlotEntry>,
    /// Highlighted slot.
    pub requested: usize,
    pub visible_lines: usize,
    pub line_offset: usize,
}

impl SlotList {
    pub fn new(slot_count: usize, visible_lines: usize) -> Self {
        Self {
            entries: vec![SlotEntry::default(); slot_count],
            requested: 0,
            visible_lines,
            line_offset: 0,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push(&mut self, text: String, blocked: bool) {
        self.entries.push(SlotEntry { text, blocked });
    }

    pub fn set(&mut self, slot: usize, text: String, blocked: bool) {
        if self.entries.len() <= slot {
            self.entries.resize(slot + 1, SlotEntry::default());
        }
        self.entries[slot] = SlotEntry { text, blocked };
    }

    pub fn is_blocked(&self, slot: usize) -> bool {
        self.entries.get(slot).is_none_or(|entry| entry.blocked)
    }

    /// Scroll so the requested slot is on screen.
    pub fn scroll_to_requested(&mut self) {
        if self.requested >= self.visible_lines {
            self.line_offset = self.requested + 1 - self.visible_lines;
        } else if self.requested < self.line_offset {
            self.line_offset = self.requested;
        }
    }
}
