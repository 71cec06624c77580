//! Rotation against a real temporary directory.
//!
//! Uses a fixed clock so folder names are deterministic; everything else
//! (listing, recursive removal, creation) hits the filesystem.

use std::fs;

use rotator::io::fs::RealFilesystem;
use rotator::test_support::{TempBase, fixed_clock};
use rotator::{FolderNaming, FolderRotator, RotateError, RotationOptions};

fn erap_options(max_folder_count: usize) -> RotationOptions {
    RotationOptions::default()
        .with_naming(FolderNaming::new("erap_", "%Y%m%d_%H%M%S").expect("naming"))
        .max_folder_count(max_folder_count)
}

/// Weekly runs: four existing folders, keep two, create the fifth.
///
/// ```text
/// erap_20210104_060000  deleted
/// erap_20210111_060000  deleted
/// erap_20210118_060000  kept
/// erap_20210125_060000  kept
/// erap_20210201_060000  created
/// notes                 untouched (no match)
/// erap_latest.csv       untouched (file)
/// ```
#[test]
fn weekly_rotation_keeps_newest_and_leaves_others_alone() {
    let base = TempBase::new().expect("temp base");
    for name in [
        "erap_20210118_060000",
        "erap_20210104_060000",
        "erap_20210125_060000",
        "erap_20210111_060000",
    ] {
        base.add_folder(name).expect("folder");
    }
    fs::create_dir(base.path().join("notes")).expect("notes");
    fs::write(base.path().join("erap_latest.csv"), "zip5\n").expect("file");

    let rotator =
        FolderRotator::with_parts(base.path(), RealFilesystem, fixed_clock(2021, 2, 1, 6, 0, 0));
    let rotation = rotator.rotate(&erap_options(2)).expect("rotate");

    assert_eq!(
        rotation.report.deleted,
        vec![
            base.path().join("erap_20210104_060000"),
            base.path().join("erap_20210111_060000"),
        ]
    );
    assert_eq!(rotation.directory, base.path().join("erap_20210201_060000"));
    assert!(rotation.directory.is_dir());
    assert_eq!(
        base.entry_names().expect("names"),
        vec![
            "erap_20210118_060000",
            "erap_20210125_060000",
            "erap_20210201_060000",
            "erap_latest.csv",
            "notes",
        ]
    );
}

#[test]
fn second_run_in_same_second_collides_unless_exist_ok() {
    let base = TempBase::new().expect("temp base");
    let rotator =
        FolderRotator::with_parts(base.path(), RealFilesystem, fixed_clock(2021, 2, 1, 6, 0, 0));

    let first = rotator
        .get_rotated_directory(&erap_options(10))
        .expect("first run");
    fs::write(first.join("ERAP_PAYMENTS.csv"), "zip5\n").expect("write");

    let err = rotator
        .get_rotated_directory(&erap_options(10))
        .expect_err("collision");
    assert!(matches!(err, RotateError::AlreadyExists { .. }));

    let again = rotator
        .get_rotated_directory(&erap_options(10).exist_ok(true))
        .expect("exist_ok run");
    assert_eq!(again, first);
    assert!(first.join("ERAP_PAYMENTS.csv").is_file());
}

#[test]
fn missing_base_directory_is_distinguished() {
    let base = TempBase::new().expect("temp base");
    let missing = base.path().join("not-mounted");

    let err = FolderRotator::new(&missing)
        .get_rotated_directory(&RotationOptions::default())
        .expect_err("missing base");

    match err {
        RotateError::MissingBaseDirectory { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!missing.exists());
}

#[test]
fn system_clock_rotation_creates_default_named_folder() {
    let base = TempBase::new().expect("temp base");

    let path = FolderRotator::new(base.path())
        .get_rotated_directory(&RotationOptions::default())
        .expect("rotate");

    assert!(path.is_dir());
    let name = path.file_name().and_then(|name| name.to_str()).expect("name");
    assert!(FolderNaming::default().is_candidate(name));
}
