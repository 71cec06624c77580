//! Retention selection over rotation candidates.

use std::path::PathBuf;

/// Candidates split by the retention count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionSplit {
    /// Oldest candidates beyond the retention count, ascending by name.
    pub delete: Vec<PathBuf>,
    /// Newest `max_folder_count` candidates, ascending by name.
    pub keep: Vec<PathBuf>,
}

/// Keep the `max_folder_count` lexicographically greatest names and mark the
/// rest for deletion.
///
/// With the default `YYYYMMDD_hhmmss` naming, name order is age order, so the
/// deletion set is always the oldest folders. Having fewer candidates than
/// the retention count is not an error; nothing is deleted.
pub fn split_by_retention(mut candidates: Vec<PathBuf>, max_folder_count: usize) -> RetentionSplit {
    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    let excess = candidates.len().saturating_sub(max_folder_count);
    let keep = candidates.split_off(excess);
    RetentionSplit {
        delete: candidates,
        keep,
    }
}
