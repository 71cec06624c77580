//! Filesystem adapter used by the rotator.
//!
//! Rotation touches the disk in exactly three ways: listing the base
//! directory, removing old folders recursively, and creating the new folder.
//! The trait covers those plus a directory check so tests can run against an
//! in-memory tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// An immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl DirEntry {
    /// Base name as UTF-8, if representable.
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

pub trait Filesystem {
    /// List the immediate children of `dir`.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

    /// Remove `path` and everything below it.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create a single directory. The parent must already exist.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    fn is_dir(&self, path: &Path) -> bool;
}

/// `std::fs` backed implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // Symlinks are not followed; a linked directory is never a candidate.
            let is_dir = entry.file_type()?.is_dir();
            entries.push(DirEntry {
                path: entry.path(),
                is_dir,
            });
        }
        Ok(entries)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
