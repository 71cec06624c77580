//! Deterministic, pure logic shared by the rotator.
//!
//! Core modules must be free of I/O side effects. They operate on names and
//! paths already read from disk and return deterministic outputs.

pub mod naming;
pub mod retention;
