//! Bounded rotation of timestamped download folders.
//!
//! A [`FolderRotator`] owns a base directory. Each call creates one new
//! `{prefix}{timestamp}` subdirectory and, beforehand, prunes the oldest
//! matching subdirectories beyond a retention count. The crate keeps the same
//! split as the rest of the workspace:
//!
//! - **[`core`]**: Pure, deterministic logic (naming, candidate matching,
//!   retention selection). No I/O.
//! - **[`io`]**: Side effects (filesystem, clock, config files), behind traits
//!   so tests can swap them out.
//!
//! [`rotate`] coordinates the two and is what callers use.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod rotate;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::naming::FolderNaming;
pub use crate::error::{DeletionFailure, NamingError, RotateError};
pub use crate::rotate::{DeletionReport, FolderRotator, Rotation, RotationOptions, RotationPlan};
