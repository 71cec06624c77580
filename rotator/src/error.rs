//! Error types for folder rotation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors from a rotation call.
///
/// Only directory listing and creation are fatal. Deletion problems never
/// surface here; they are collected as [`DeletionFailure`]s in the report.
#[derive(Debug, Error)]
pub enum RotateError {
    /// The base directory was absent when listing or creating.
    #[error("base directory `{}` does not exist", path.display())]
    MissingBaseDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The new directory already exists and `exist_ok` is false.
    #[error("directory `{}` already exists", path.display())]
    AlreadyExists { path: PathBuf },

    /// The base directory exists but could not be read.
    #[error("list rotation candidates in `{}`", dir.display())]
    ListCandidates {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Naming(#[from] NamingError),

    /// Any other directory creation failure, passed through as-is.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Problems with a prefix/date format/pattern combination.
#[derive(Debug, Error)]
pub enum NamingError {
    #[error("invalid date format `{0}`")]
    InvalidDateFormat(String),

    #[error("date format `{format}` uses `{specifier}`, which has no derived pattern; supply one")]
    UnsupportedSpecifier { format: String, specifier: String },

    #[error("invalid folder pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The pattern does not match names produced by the date format.
    #[error("pattern `{pattern}` does not match `{sample}` produced by date format `{format}`")]
    PatternMismatch {
        pattern: String,
        format: String,
        sample: String,
    },
}

/// A folder that could not be removed during rotation.
#[derive(Debug, Error)]
#[error("could not delete `{}`; delete manually", path.display())]
pub struct DeletionFailure {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}
