//! File access used by the save orchestrator.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    /// Create or truncate.
    Write,
}

pub trait FileSystem {
    type File: Read + Write;

    fn open(&self, name: &str, mode: OpenMode) -> io::Result<Self::File>;

    fn delete(&self, name: &str) -> io::Result<()>;

    /// Full path of `name`, for diagnostics.
    fn path_of(&self, name: &str) -> PathBuf {
        PathBuf::from(name)
    }
}

/// Save files under one directory on disk.
#[derive(Debug, Clone)]
pub struct DiskFileSystem {
    root: PathBuf,
}

impl DiskFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSystem for DiskFileSystem {
    type File = File;

    fn open(&self, name: &str, mode: OpenMode) -> io::Result<File> {
        let path = self.path_of(name);
        match mode {
            OpenMode::Read => File::open(path),
            OpenMode::Write => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path),
        }
    }

    fn delete(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.path_of(name))
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

type Files = Rc<RefCell<HashMap<String, Vec<u8>>>>;

/// In-memory file system. Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Files,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, bytes: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(name.to_string(), bytes.into());
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.borrow().contains_key(name)
    }

    /// Make opening `name` fail, as a read-only or locked file would.
    pub fn lock(&self, name: &str) {
        self.files.borrow_mut().remove(name);
        self.files
            .borrow_mut()
            .insert(format!("{LOCK_PREFIX}{name}"), Vec::new());
    }
}

const LOCK_PREFIX: &str = "\0locked:";

/// Handle to a [`MemoryFileSystem`] file. Written bytes are published when the
/// handle is flushed or dropped.
#[derive(Debug)]
pub struct MemoryFile {
    name: String,
    data: Vec<u8>,
    pos: usize,
    mode: OpenMode,
    files: Files,
}

impl Read for MemoryFile {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let rest = self.data.get(self.pos..).unwrap_or(&[]);
        let n = rest.len().min(out.len());
        out[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for MemoryFile {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if self.mode != OpenMode::Write {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file was opened for reading",
            ));
        }
        self.data.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.mode == OpenMode::Write {
            self.files
                .borrow_mut()
                .insert(self.name.clone(), self.data.clone());
        }
        Ok(())
    }
}

impl Drop for MemoryFile {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl FileSystem for MemoryFileSystem {
    type File = MemoryFile;

    fn open(&self, name: &str, mode: OpenMode) -> io::Result<MemoryFile> {
        let files = self.files.borrow();
        if files.contains_key(&format!("{LOCK_PREFIX}{name}")) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{name} is locked"),
            ));
        }
        let data = match mode {
            OpenMode::Read => files
                .get(name)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))?,
            OpenMode::Write => Vec::new(),
        };
        drop(files);

        Ok(MemoryFile {
            name: name.to_string(),
            data,
            pos: 0,
            mode,
            files: Rc::clone(&self.files),
        })
    }

    fn delete(&self, name: &str) -> io::Result<()> {
        self.files
            .borrow_mut()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))
    }
}
