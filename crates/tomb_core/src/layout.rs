use serde::Serialize;

use crate::error::SaveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum SectionId {
    Title,
    Counter,
    StartInfo,
    Aggregate,
    ItemStats,
    FlipStatus,
    FlipTable,
    Cameras,
    Item(usize),
    Player,
    Trailer,
    /// Bytes past the header that were not decoded.
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionLayout {
    pub id: SectionId,
    pub range: ByteRange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileLayout {
    pub file_len: usize,
    pub sections: Vec<SectionLayout>,
}

impl FileLayout {
    /// Append a section running from the end of the previous one to `end`.
    pub fn push(&mut self, id: SectionId, end: usize) {
        let start = self.sections.last().map_or(0, |s| s.range.end);
        self.sections.push(SectionLayout {
            id,
            range: ByteRange::new(start, end),
        });
    }

    pub fn section(&self, id: SectionId) -> Option<&SectionLayout> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        let Some(first) = self.sections.first() else {
            return Err(SaveError::Layout(
                "file layout must contain at least one section".to_string(),
            ));
        };

        if first.range.start != 0 {
            return Err(SaveError::Layout("layout does not start at byte 0".to_string()));
        }

        let mut expected = 0usize;
        for section in &self.sections {
            if section.range.start != expected {
                return Err(SaveError::Layout(format!(
                    "gap/overlap around section {:?}: expected start {}, got {}",
                    section.id, expected, section.range.start
                )));
            }
            if section.range.end < section.range.start {
                return Err(SaveError::Layout(format!(
                    "invalid section range {:?}: {}..{}",
                    section.id, section.range.start, section.range.end
                )));
            }
            expected = section.range.end;
        }

        if expected != self.file_len {
            return Err(SaveError::Layout(format!(
                "layout does not cover file: ended at {}, file length {}",
                expected, self.file_len
            )));
        }

        Ok(())
    }
}
