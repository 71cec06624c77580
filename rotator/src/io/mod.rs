//! I/O adapters for the rotator.

pub mod clock;
pub mod config;
pub mod fs;
