use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The encoded session does not fit the save buffer. Never recoverable: the
    /// save is abandoned before any file is touched.
    #[error("savegame is too big to fit in buffer: {needed} bytes needed, capacity is {capacity}")]
    BufferOverflow { needed: usize, capacity: usize },
    #[error("unexpected end of save buffer: wanted {wanted} bytes at offset {offset}, buffer is {len} bytes")]
    UnexpectedEnd {
        offset: usize,
        wanted: usize,
        len: usize,
    },
    #[error("{table} index {index} has no entry in the level table")]
    DanglingReference { table: &'static str, index: usize },
    #[error("save slot {slot} is out of range, expected 0..{count}")]
    InvalidSlot { slot: usize, count: usize },
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid gameflow: {0}")]
    Config(String),
    #[error("invalid file layout: {0}")]
    Layout(String),
}

impl SaveError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::BufferOverflow { .. })
    }
}
