//! Stable exit codes for the `rotator` CLI.

use crate::error::RotateError;

/// Rotation (or plan) succeeded.
pub const OK: i32 = 0;
/// Invalid arguments, config, naming, or any other failure.
pub const INVALID: i32 = 1;
/// The base directory does not exist.
pub const MISSING_BASE_DIRECTORY: i32 = 2;
/// The new folder already exists and `--exist-ok` was not given.
pub const ALREADY_EXISTS: i32 = 3;

/// Exit code for an error chain, looking for a [`RotateError`] inside it.
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<RotateError>() {
        Some(RotateError::MissingBaseDirectory { .. }) => MISSING_BASE_DIRECTORY,
        Some(RotateError::AlreadyExists { .. }) => ALREADY_EXISTS,
        _ => INVALID,
    }
}
