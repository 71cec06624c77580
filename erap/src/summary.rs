//! End-of-run summary email.

use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, TimeDelta};

pub const SUMMARY_SUBJECT: &str = "ERAP Update Summary";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryMessage {
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

/// Counts gathered over one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub download_dir: PathBuf,
    pub folders_deleted: usize,
    pub folders_not_deleted: Vec<PathBuf>,
    pub files_downloaded: usize,
    pub rows_updated: usize,
    pub reclassified: bool,
}

pub fn build_summary(subject_prefix: &str, stats: &RunStats, log_path: &Path) -> SummaryMessage {
    let mut lines = vec![
        format!("ERAP update {}", stats.start.format("%Y-%m-%d")),
        "=".repeat(20),
        String::new(),
        format!("Start time: {}", stats.start.format("%H:%M:%S")),
        format!("End time: {}", stats.end.format("%H:%M:%S")),
        format!("Duration: {}", format_duration(stats.end - stats.start)),
        format!("Download folder: {}", stats.download_dir.display()),
        format!("{} old download folder(s) deleted", stats.folders_deleted),
    ];
    lines.extend(
        stats
            .folders_not_deleted
            .iter()
            .map(|path| format!("Could not delete {}; delete manually", path.display())),
    );
    lines.push(format!("{} files downloaded from SFTP", stats.files_downloaded));
    lines.push(format!("{} rows updated in Feature Service", stats.rows_updated));
    lines.push(format!(
        "Reclassifier webmap update operation: {}",
        if stats.reclassified { "Success" } else { "Failure" }
    ));

    let mut body = lines.join("\n");
    body.push('\n');
    SummaryMessage {
        subject: format!("{subject_prefix}{SUMMARY_SUBJECT}"),
        body,
        attachments: vec![log_path.to_path_buf()],
    }
}

/// `H:MM:SS`; negative spans (clock stepped back) render as zero.
pub fn format_duration(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    format!("{}:{:02}:{:02}", total / 3600, total / 60 % 60, total % 60)
}
