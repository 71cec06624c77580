//! Folder rotation: prune the oldest matching folders, then create a new one.
//!
//! Deletion always runs before creation, so the folder created by a call is
//! never part of that call's deletion set.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{Span, debug, info, info_span, warn};

use crate::core::naming::FolderNaming;
use crate::core::retention::split_by_retention;
use crate::error::{DeletionFailure, RotateError};
use crate::io::clock::{Clock, SystemClock};
use crate::io::fs::{Filesystem, RealFilesystem};

/// Existing folders kept when no count is configured.
pub const DEFAULT_MAX_FOLDER_COUNT: usize = 10;

/// Per-call rotation settings.
#[derive(Debug, Clone)]
pub struct RotationOptions {
    /// Prefix, date format and matching pattern, kept as one value.
    pub naming: FolderNaming,
    /// Accept an existing directory at the new path instead of failing.
    pub exist_ok: bool,
    /// Existing matching folders to keep, not counting the one created.
    pub max_folder_count: usize,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            naming: FolderNaming::default(),
            exist_ok: false,
            max_folder_count: DEFAULT_MAX_FOLDER_COUNT,
        }
    }
}

impl RotationOptions {
    pub fn with_naming(mut self, naming: FolderNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn exist_ok(mut self, exist_ok: bool) -> Self {
        self.exist_ok = exist_ok;
        self
    }

    pub fn max_folder_count(mut self, max_folder_count: usize) -> Self {
        self.max_folder_count = max_folder_count;
        self
    }
}

/// Outcome of the deletion pass.
#[derive(Debug, Default)]
pub struct DeletionReport {
    /// Folders actually removed, oldest first.
    pub deleted: Vec<PathBuf>,
    /// Folders that could not be removed and were skipped.
    pub failed: Vec<DeletionFailure>,
}

impl DeletionReport {
    /// Collect per-folder results, keeping their order.
    pub fn from_results(results: impl IntoIterator<Item = (PathBuf, io::Result<()>)>) -> Self {
        let mut report = Self::default();
        for (path, result) in results {
            match result {
                Ok(()) => report.deleted.push(path),
                Err(source) => report.failed.push(DeletionFailure { path, source }),
            }
        }
        report
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of a successful rotation.
#[derive(Debug)]
pub struct Rotation {
    /// The newly created (or, with `exist_ok`, reused) directory.
    pub directory: PathBuf,
    pub report: DeletionReport,
}

/// What a rotation would do right now, without touching the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPlan {
    /// Matching folders, ascending by name.
    pub candidates: Vec<PathBuf>,
    /// Folders that would be deleted, ascending by name.
    pub to_delete: Vec<PathBuf>,
    pub next_directory: PathBuf,
}

/// Creates timestamped folders under a base directory and prunes old ones.
///
/// The base directory is not checked at construction; a missing base shows
/// up as [`RotateError::MissingBaseDirectory`] on the first call. Calls are
/// not synchronised; run one rotation per base directory at a time.
#[derive(Debug)]
pub struct FolderRotator<F = RealFilesystem, C = SystemClock> {
    base_dir: PathBuf,
    fs: F,
    clock: C,
    span: Span,
}

impl FolderRotator {
    /// Rotator over the real filesystem and the local wall clock.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_parts(base_dir, RealFilesystem, SystemClock)
    }
}

impl<F: Filesystem, C: Clock> FolderRotator<F, C> {
    pub fn with_parts(base_dir: impl Into<PathBuf>, fs: F, clock: C) -> Self {
        let base_dir = base_dir.into();
        let span = info_span!("folder_rotator", base_dir = %base_dir.display());
        Self {
            base_dir,
            fs,
            clock,
            span,
        }
    }

    /// Log under the caller's span instead of the default `folder_rotator` one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Rotate and return the new directory's path.
    ///
    /// Folder deletion failures are logged and skipped; use [`Self::rotate`]
    /// to see them.
    pub fn get_rotated_directory(&self, options: &RotationOptions) -> Result<PathBuf, RotateError> {
        self.rotate(options).map(|rotation| rotation.directory)
    }

    /// Delete the oldest folders beyond `max_folder_count`, then create
    /// `base_dir/{prefix}{now}`.
    pub fn rotate(&self, options: &RotationOptions) -> Result<Rotation, RotateError> {
        let _entered = self.span.enter();

        let to_delete = self.folders_to_delete(options)?;
        let report = self.delete_folders(to_delete);
        let deleted: Vec<String> = report
            .deleted
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        info!(
            failed = report.failed.len(),
            "deleted {} folder(s) for rotation: {:?}",
            deleted.len(),
            deleted
        );

        let directory = self.new_directory_path(&options.naming)?;
        self.make_directory(&directory, options.exist_ok)?;
        Ok(Rotation { directory, report })
    }

    /// Compute the rotation without deleting or creating anything.
    pub fn plan(&self, options: &RotationOptions) -> Result<RotationPlan, RotateError> {
        let _entered = self.span.enter();

        let candidates = self.candidates(&options.naming)?;
        let split = split_by_retention(candidates.clone(), options.max_folder_count);
        let next_directory = self.new_directory_path(&options.naming)?;
        Ok(RotationPlan {
            candidates,
            to_delete: split.delete,
            next_directory,
        })
    }

    fn candidates(&self, naming: &FolderNaming) -> Result<Vec<PathBuf>, RotateError> {
        debug!(pattern = naming.matcher().as_str(), "folder regex pattern");
        let entries = self
            .fs
            .read_dir(&self.base_dir)
            .map_err(|source| self.listing_error(source))?;
        let mut candidates: Vec<PathBuf> = entries
            .into_iter()
            .filter(|entry| entry.is_dir && entry.name().is_some_and(|name| naming.is_candidate(name)))
            .map(|entry| entry.path)
            .collect();
        candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(candidates)
    }

    fn listing_error(&self, source: io::Error) -> RotateError {
        if source.kind() == io::ErrorKind::NotFound {
            RotateError::MissingBaseDirectory {
                path: self.base_dir.clone(),
                source,
            }
        } else {
            RotateError::ListCandidates {
                dir: self.base_dir.clone(),
                source,
            }
        }
    }

    fn folders_to_delete(&self, options: &RotationOptions) -> Result<Vec<PathBuf>, RotateError> {
        let candidates = self.candidates(&options.naming)?;
        if options.max_folder_count > candidates.len() {
            debug!(
                "max_folder_count `{}` greater than number of existing folders `{}`; no folders deleted",
                options.max_folder_count,
                candidates.len()
            );
        }
        Ok(split_by_retention(candidates, options.max_folder_count).delete)
    }

    fn delete_folders(&self, folders: Vec<PathBuf>) -> DeletionReport {
        DeletionReport::from_results(folders.into_iter().map(|folder| {
            debug!(folder = %folder.display(), "attempting to delete folder");
            let result = self.fs.remove_dir_all(&folder);
            match &result {
                Ok(()) => debug!(folder = %folder.display(), "deleted folder"),
                Err(err) => warn!(
                    folder = %folder.display(),
                    error = %err,
                    "could not delete folder; delete manually"
                ),
            }
            (folder, result)
        }))
    }

    fn new_directory_path(&self, naming: &FolderNaming) -> Result<PathBuf, RotateError> {
        let name = naming.folder_name(&self.clock.now())?;
        Ok(self.base_dir.join(name))
    }

    fn make_directory(&self, path: &Path, exist_ok: bool) -> Result<(), RotateError> {
        debug!(path = %path.display(), "attempting to create new directory");
        match self.fs.create_dir(path) {
            Ok(()) => {
                debug!(path = %path.display(), "created directory");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                if exist_ok && self.fs.is_dir(path) {
                    debug!(path = %path.display(), "directory already exists; reusing it");
                    Ok(())
                } else {
                    Err(RotateError::AlreadyExists {
                        path: path.to_path_buf(),
                    })
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound && !self.fs.is_dir(&self.base_dir) => {
                Err(RotateError::MissingBaseDirectory {
                    path: self.base_dir.clone(),
                    source: err,
                })
            }
            Err(err) => Err(RotateError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::clock::FixedClock;
    use crate::test_support::{FsOp, MockFilesystem, capture_logs, timestamp};

    const BASE: &str = "/data/erap";

    fn rotator(fs: &MockFilesystem) -> FolderRotator<MockFilesystem, FixedClock> {
        FolderRotator::with_parts(
            BASE,
            fs.clone(),
            FixedClock::new(timestamp(2021, 2, 1, 0, 0, 0)),
        )
    }

    fn foo_options(max_folder_count: usize) -> RotationOptions {
        let naming = FolderNaming::with_pattern("foo_", "%Y%m%d_%H%M%S", "[0-9]{8}_[0-9]{6}")
            .expect("naming");
        RotationOptions::default()
            .with_naming(naming)
            .max_folder_count(max_folder_count)
    }

    fn base(name: &str) -> PathBuf {
        Path::new(BASE).join(name)
    }

    fn fs_with_foo_folders() -> MockFilesystem {
        let fs = MockFilesystem::new();
        fs.add_dir(BASE);
        for name in [
            "foo_20210101_010101",
            "foo_20210101_010102",
            "foo_20210101_010103",
        ] {
            fs.add_dir(base(name));
        }
        fs
    }

    #[test]
    fn options_default_to_documented_values() {
        let options = RotationOptions::default();
        assert_eq!(options.naming.prefix(), "");
        assert_eq!(options.naming.date_format(), "%Y%m%d_%H%M%S");
        assert_eq!(options.naming.pattern(), "[0-9]{8}_[0-9]{6}");
        assert!(!options.exist_ok);
        assert_eq!(options.max_folder_count, 10);
    }

    #[test]
    fn rotate_deletes_oldest_and_creates_new_folder() {
        let fs = fs_with_foo_folders();

        let rotation = rotator(&fs).rotate(&foo_options(2)).expect("rotate");

        assert_eq!(rotation.directory, base("foo_20210201_000000"));
        assert_eq!(rotation.report.deleted, vec![base("foo_20210101_010101")]);
        assert!(rotation.report.is_clean());
        assert!(!fs.has_dir(&base("foo_20210101_010101")));
        assert!(fs.has_dir(&base("foo_20210101_010102")));
        assert!(fs.has_dir(&base("foo_20210101_010103")));
        assert!(fs.has_dir(&base("foo_20210201_000000")));
    }

    #[test]
    fn get_rotated_directory_returns_new_path() {
        let fs = fs_with_foo_folders();
        let path = rotator(&fs)
            .get_rotated_directory(&foo_options(2))
            .expect("rotate");
        assert_eq!(path, base("foo_20210201_000000"));
    }

    #[test]
    fn excess_retention_deletes_nothing_and_logs_why() {
        let fs = fs_with_foo_folders();

        let (result, logs) = capture_logs(|| rotator(&fs).rotate(&foo_options(5)));
        let rotation = result.expect("rotate");

        assert!(rotation.report.deleted.is_empty());
        assert_eq!(fs.child_dirs(Path::new(BASE)).len(), 4);
        assert!(logs.contains(
            "max_folder_count `5` greater than number of existing folders `3`; no folders deleted"
        ));
        assert!(logs.contains("deleted 0 folder(s) for rotation"));
    }

    #[test]
    fn deletion_failure_is_skipped_and_reported() {
        let fs = fs_with_foo_folders();
        fs.fail_remove(base("foo_20210101_010101"), io::ErrorKind::PermissionDenied);

        let (result, logs) = capture_logs(|| rotator(&fs).rotate(&foo_options(1)));
        let rotation = result.expect("rotate");

        assert_eq!(rotation.report.deleted, vec![base("foo_20210101_010102")]);
        assert_eq!(rotation.report.failed.len(), 1);
        assert_eq!(rotation.report.failed[0].path, base("foo_20210101_010101"));
        assert!(fs.has_dir(&base("foo_20210101_010101")));
        assert!(fs.has_dir(&base("foo_20210201_000000")));
        assert!(logs.contains("could not delete folder; delete manually"));
    }

    #[test]
    fn failure_on_first_folder_does_not_block_later_ones() {
        let fs = MockFilesystem::new();
        fs.add_dir(base("foo"));
        fs.add_dir(base("bar"));
        fs.fail_remove(base("foo"), io::ErrorKind::Other);

        let report = rotator(&fs).delete_folders(vec![base("foo"), base("bar")]);

        assert_eq!(report.deleted, vec![base("bar")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, base("foo"));
    }

    #[test]
    fn all_deletions_failing_still_creates_expected_folder() {
        let fs = fs_with_foo_folders();
        fs.fail_remove(base("foo_20210101_010101"), io::ErrorKind::Other);
        fs.fail_remove(base("foo_20210101_010102"), io::ErrorKind::Other);
        fs.fail_remove(base("foo_20210101_010103"), io::ErrorKind::Other);

        let rotation = rotator(&fs).rotate(&foo_options(0)).expect("rotate");

        assert!(rotation.report.deleted.is_empty());
        assert_eq!(rotation.report.failed.len(), 3);
        assert_eq!(rotation.directory, base("foo_20210201_000000"));
    }

    #[test]
    fn non_matching_siblings_are_never_touched() {
        let fs = fs_with_foo_folders();
        fs.add_dir(base("bar_20200101_000000"));
        fs.add_dir(base("archive"));
        fs.add_dir(base("xfoo_20200101_000000"));
        fs.add_file(base("foo_20200101_000000"));

        let rotation = rotator(&fs).rotate(&foo_options(0)).expect("rotate");

        assert_eq!(rotation.report.deleted.len(), 3);
        assert!(fs.has_dir(&base("bar_20200101_000000")));
        assert!(fs.has_dir(&base("archive")));
        assert!(fs.has_dir(&base("xfoo_20200101_000000")));
        assert!(fs.has_file(&base("foo_20200101_000000")));
    }

    #[test]
    fn deletion_precedes_creation() {
        let fs = fs_with_foo_folders();

        rotator(&fs).rotate(&foo_options(1)).expect("rotate");

        assert_eq!(
            fs.ops(),
            vec![
                FsOp::ReadDir(PathBuf::from(BASE)),
                FsOp::Remove(base("foo_20210101_010101")),
                FsOp::Remove(base("foo_20210101_010102")),
                FsOp::Create(base("foo_20210201_000000")),
            ]
        );
    }

    #[test]
    fn missing_base_directory_is_reported_as_such() {
        let fs = MockFilesystem::new();

        let err = rotator(&fs)
            .rotate(&RotationOptions::default())
            .expect_err("missing base");

        match err {
            RotateError::MissingBaseDirectory { path, .. } => assert_eq!(path, PathBuf::from(BASE)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!fs.ops().iter().any(|op| matches!(op, FsOp::Create(_))));
    }

    #[test]
    fn base_vanishing_before_creation_is_missing_base_directory() {
        let fs = fs_with_foo_folders();
        fs.remove_before_create(BASE);

        let err = rotator(&fs).rotate(&foo_options(10)).expect_err("missing base");

        assert!(matches!(err, RotateError::MissingBaseDirectory { .. }));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn missing_parent_inside_existing_base_is_plain_io() {
        let fs = fs_with_foo_folders();
        let nested = FolderNaming::new("foo_", "%Y/%m%d").expect("naming");

        let err = rotator(&fs)
            .rotate(&RotationOptions::default().with_naming(nested))
            .expect_err("nested target");

        match err {
            RotateError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(fs.has_dir(Path::new(BASE)));
        assert!(!fs.has_dir(&base("foo_2021")));
    }

    #[test]
    fn existing_target_fails_without_exist_ok() {
        let fs = fs_with_foo_folders();
        fs.add_dir(base("foo_20210201_000000"));

        let err = rotator(&fs).rotate(&foo_options(10)).expect_err("exists");

        match err {
            RotateError::AlreadyExists { path } => assert_eq!(path, base("foo_20210201_000000")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn existing_target_is_reused_with_exist_ok() {
        let fs = fs_with_foo_folders();
        fs.add_dir(base("foo_20210201_000000"));
        fs.add_file(base("foo_20210201_000000").join("ERAP_PAYMENTS.csv"));

        let rotation = rotator(&fs)
            .rotate(&foo_options(10).exist_ok(true))
            .expect("rotate");

        assert_eq!(rotation.directory, base("foo_20210201_000000"));
        assert!(fs.has_file(&base("foo_20210201_000000").join("ERAP_PAYMENTS.csv")));
    }

    #[test]
    fn existing_file_at_target_fails_even_with_exist_ok() {
        let fs = fs_with_foo_folders();
        fs.add_file(base("foo_20210201_000000"));

        let err = rotator(&fs)
            .rotate(&foo_options(10).exist_ok(true))
            .expect_err("file in the way");

        assert!(matches!(err, RotateError::AlreadyExists { .. }));
    }

    #[test]
    fn other_creation_errors_propagate_unchanged() {
        let fs = fs_with_foo_folders();
        fs.fail_create(io::ErrorKind::PermissionDenied);

        let err = rotator(&fs).rotate(&foo_options(10)).expect_err("denied");

        match err {
            RotateError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plan_reports_without_mutating() {
        let fs = fs_with_foo_folders();

        let plan = rotator(&fs).plan(&foo_options(1)).expect("plan");

        assert_eq!(plan.candidates.len(), 3);
        assert_eq!(
            plan.to_delete,
            vec![base("foo_20210101_010101"), base("foo_20210101_010102")]
        );
        assert_eq!(plan.next_directory, base("foo_20210201_000000"));
        assert_eq!(fs.ops(), vec![FsOp::ReadDir(PathBuf::from(BASE))]);
    }

    #[test]
    fn deletion_report_keeps_result_order() {
        let report = DeletionReport::from_results(vec![
            (PathBuf::from("a"), Ok(())),
            (PathBuf::from("b"), Err(io::Error::from(io::ErrorKind::Other))),
            (PathBuf::from("c"), Ok(())),
        ]);
        assert_eq!(report.deleted, vec![PathBuf::from("a"), PathBuf::from("c")]);
        assert_eq!(report.failed[0].path, PathBuf::from("b"));
        assert!(!report.is_clean());
    }
}
