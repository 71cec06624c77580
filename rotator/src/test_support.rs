//! Test-only helpers: an in-memory filesystem, log capture, and on-disk fixtures.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use crate::io::clock::FixedClock;
use crate::io::fs::{DirEntry, Filesystem};

/// Operation recorded by [`MockFilesystem`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsOp {
    ReadDir(PathBuf),
    Remove(PathBuf),
    Create(PathBuf),
}

#[derive(Debug, Default)]
struct MockState {
    dirs: BTreeSet<PathBuf>,
    files: BTreeSet<PathBuf>,
    remove_failures: BTreeMap<PathBuf, io::ErrorKind>,
    create_failure: Option<io::ErrorKind>,
    remove_before_create: Option<PathBuf>,
    ops: Vec<FsOp>,
}

/// In-memory directory tree with injectable failures.
///
/// Cloning creates a new handle to the same tree, so a test can keep one
/// handle for assertions after moving another into a rotator.
#[derive(Debug, Clone, Default)]
pub struct MockFilesystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory and all of its ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        for ancestor in path.as_ref().ancestors() {
            if !ancestor.as_os_str().is_empty() {
                state.dirs.insert(ancestor.to_path_buf());
            }
        }
    }

    /// Add a file, creating its parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.lock().files.insert(path.to_path_buf());
    }

    /// Make `remove_dir_all(path)` fail with `kind`.
    pub fn fail_remove(&self, path: impl Into<PathBuf>, kind: io::ErrorKind) {
        self.lock().remove_failures.insert(path.into(), kind);
    }

    /// Make every `create_dir` fail with `kind`.
    pub fn fail_create(&self, kind: io::ErrorKind) {
        self.lock().create_failure = Some(kind);
    }

    /// Drop `path` and everything under it just before the next `create_dir`,
    /// as if another process removed it mid-rotation.
    pub fn remove_before_create(&self, path: impl Into<PathBuf>) {
        self.lock().remove_before_create = Some(path.into());
    }

    pub fn has_dir(&self, path: &Path) -> bool {
        self.lock().dirs.contains(path)
    }

    pub fn has_file(&self, path: &Path) -> bool {
        self.lock().files.contains(path)
    }

    /// Immediate child directories of `dir`, sorted.
    pub fn child_dirs(&self, dir: &Path) -> Vec<PathBuf> {
        self.lock()
            .dirs
            .iter()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect()
    }

    pub fn ops(&self) -> Vec<FsOp> {
        self.lock().ops.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock filesystem lock")
    }
}

impl Filesystem for MockFilesystem {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut state = self.lock();
        state.ops.push(FsOp::ReadDir(dir.to_path_buf()));
        if !state.dirs.contains(dir) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", dir.display()),
            ));
        }
        let dirs = state.dirs.iter().map(|path| (path, true));
        let files = state.files.iter().map(|path| (path, false));
        Ok(dirs
            .chain(files)
            .filter(|(path, _)| path.parent() == Some(dir))
            .map(|(path, is_dir)| DirEntry {
                path: path.clone(),
                is_dir,
            })
            .collect())
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.ops.push(FsOp::Remove(path.to_path_buf()));
        if let Some(kind) = state.remove_failures.get(path) {
            return Err(io::Error::new(
                *kind,
                format!("injected failure removing {}", path.display()),
            ));
        }
        if !state.dirs.contains(path) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        state.dirs.retain(|dir| !dir.starts_with(path));
        state.files.retain(|file| !file.starts_with(path));
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.ops.push(FsOp::Create(path.to_path_buf()));
        if let Some(gone) = state.remove_before_create.take() {
            state.dirs.retain(|dir| !dir.starts_with(&gone));
            state.files.retain(|file| !file.starts_with(&gone));
        }
        if let Some(kind) = state.create_failure {
            return Err(io::Error::new(
                kind,
                format!("injected failure creating {}", path.display()),
            ));
        }
        if state.dirs.contains(path) || state.files.contains(path) {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists));
        }
        let parent_exists = path
            .parent()
            .is_some_and(|parent| parent.as_os_str().is_empty() || state.dirs.contains(parent));
        if !parent_exists {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lock().dirs.contains(path)
    }
}

/// Build a timestamp, panicking on out-of-range fields.
pub fn timestamp(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, min, sec))
        .expect("valid test timestamp")
}

pub fn fixed_clock(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> FixedClock {
    FixedClock::new(timestamp(year, month, day, hour, min, sec))
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a debug-level subscriber and return its result plus the
/// plain-text log output.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().expect("log buffer lock").clone();
    (result, String::from_utf8_lossy(&bytes).into_owned())
}

/// Temporary base directory on the real filesystem.
pub struct TempBase {
    dir: TempDir,
}

impl TempBase {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a subfolder holding one small file so removal is recursive.
    pub fn add_folder(&self, name: &str) -> io::Result<PathBuf> {
        let path = self.path().join(name);
        fs::create_dir(&path)?;
        fs::write(path.join("ERAP_PAYMENTS.csv"), "zip5,Count_,Amount,Updated\n")?;
        Ok(path)
    }

    /// Names of the immediate children, sorted.
    pub fn entry_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.path())? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
