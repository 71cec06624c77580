//! One end-to-end run of the weekly sync.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rotator::FolderRotator;
use rotator::io::clock::Clock;
use rotator::io::fs::RealFilesystem;
use tracing::{info, info_span, instrument, warn};

use crate::collaborators::{
    ArchiveStore, FeatureLayerUpdater, MapReclassifier, Notifier, SftpSource,
};
use crate::config::{JobConfig, load_config};
use crate::logging;
use crate::records::read_payments;
use crate::secrets::{MOUNTED_SECRETS_ROOT, Secrets, load_secrets};
use crate::summary::{RunStats, SummaryMessage, build_summary};

/// Services a run needs, borrowed from the caller.
pub struct Collaborators<'a> {
    pub sftp: &'a dyn SftpSource,
    pub archive: &'a dyn ArchiveStore,
    pub layer: &'a dyn FeatureLayerUpdater,
    pub reclassifier: &'a dyn MapReclassifier,
    pub notifier: &'a dyn Notifier,
}

/// Services built for one run; they own their connections.
pub struct Services {
    pub sftp: Box<dyn SftpSource>,
    pub archive: Box<dyn ArchiveStore>,
    pub layer: Box<dyn FeatureLayerUpdater>,
    pub reclassifier: Box<dyn MapReclassifier>,
    pub notifier: Box<dyn Notifier>,
}

impl Services {
    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            sftp: self.sftp.as_ref(),
            archive: self.archive.as_ref(),
            layer: self.layer.as_ref(),
            reclassifier: self.reclassifier.as_ref(),
            notifier: self.notifier.as_ref(),
        }
    }
}

/// Where a run reads its settings and secrets from.
#[derive(Debug, Clone)]
pub struct JobPaths {
    pub config: PathBuf,
    /// Secrets volume; wins over `local_root` when it exists.
    pub mounted_secrets: PathBuf,
    /// Directory holding a `secrets/` folder for local runs.
    pub local_root: PathBuf,
}

impl JobPaths {
    /// Secrets from the container mount, falling back to `local_root`.
    pub fn deployed(config: impl Into<PathBuf>, local_root: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            mounted_secrets: PathBuf::from(MOUNTED_SECRETS_ROOT),
            local_root: local_root.into(),
        }
    }
}

#[derive(Debug)]
pub struct JobReport {
    pub download_dir: PathBuf,
    pub folders_deleted: Vec<PathBuf>,
    pub folders_not_deleted: Vec<PathBuf>,
    pub files_downloaded: usize,
    pub rows_updated: usize,
    pub reclassified: bool,
    pub summary: SummaryMessage,
}

/// Per-run log file name, e.g. `log_20210201-060000.txt`.
pub fn log_file_name(log_name: &str, start: &NaiveDateTime) -> String {
    format!("{log_name}_{}.txt", start.format("%Y%m%d-%H%M%S"))
}

/// Archive name for the downloaded CSV, e.g. `ERAP_PAYMENTS_20210201-060000.csv`.
pub fn archive_blob_name(file_name: &str, start: &NaiveDateTime) -> String {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    format!("{stem}_{}.csv", start.format("%Y%m%d-%H%M%S"))
}

/// Entry point for a scheduled run.
///
/// Loads the config, then the secrets, then starts logging to
/// `log_{start}.txt` in a temporary directory before `build` connects the
/// services. The log directory is removed once [`run_job`] has archived it.
/// Installs the global subscriber, so call it once per process.
pub fn run<C, B>(paths: &JobPaths, clock: &C, build: B) -> Result<JobReport>
where
    C: Clock + Clone,
    B: FnOnce(&JobConfig, &Secrets) -> Result<Services>,
{
    let config = load_config(&paths.config)?;
    let secrets = load_secrets(&paths.mounted_secrets, &paths.local_root)?;

    let start = clock.now();
    let log_dir = tempfile::tempdir().context("create log directory")?;
    let log_path = log_dir.path().join(log_file_name(&config.log_name, &start));
    logging::init(&log_path, &config.log_level)?;
    info!(log = %log_path.display(), "starting ERAP update");

    let services = build(&config, &secrets).context("connect to services")?;
    run_job(&config, &services.collaborators(), clock, &log_path)
}

/// Rotate the download folder, sync the data, and send the summary.
///
/// Steps run in order and the first failing step aborts the run. Folders
/// that could not be pruned are logged and reported but never abort it.
#[instrument(skip_all, fields(item_id = %config.feature_layer_item_id))]
pub fn run_job<C: Clock + Clone>(
    config: &JobConfig,
    collaborators: &Collaborators<'_>,
    clock: &C,
    log_path: &Path,
) -> Result<JobReport> {
    let start = clock.now();

    let base_dir = config
        .download
        .base_dir
        .as_deref()
        .context("download.base_dir is not set")?;
    let options = config.download.to_rotator_config().to_options()?;
    let rotation = FolderRotator::with_parts(base_dir, RealFilesystem, clock.clone())
        .with_span(info_span!("download_rotation", base_dir = %base_dir.display()))
        .rotate(&options)
        .context("prepare download folder")?;
    let download_dir = rotation.directory;
    let folders_not_deleted: Vec<PathBuf> = rotation
        .report
        .failed
        .iter()
        .map(|failure| failure.path.clone())
        .collect();

    info!(dir = %download_dir.display(), "getting data from SFTP");
    let files = collaborators
        .sftp
        .download_folder(&download_dir)
        .context("download from SFTP")?;
    info!(files = files.len(), "downloaded");

    let csv_path = download_dir.join(&config.file_name);
    let records = read_payments(&csv_path)?;
    info!(records = records.len(), "read payment records");

    let blob_name = archive_blob_name(&config.file_name, &start);
    info!(%blob_name, bucket = %config.storage_bucket, "saving data file to cloud storage");
    collaborators
        .archive
        .upload(&csv_path, &blob_name)
        .context("archive data file")?;

    info!("updating data in AGOL");
    let rows_updated = collaborators
        .layer
        .update_existing(
            &config.feature_layer_item_id,
            &config.key_column,
            &config.update_fields,
            &records,
        )
        .context("update feature layer")?;
    info!(rows_updated, "feature layer updated");

    info!(layer = %config.layer_name, "reclassifying the map");
    let reclassified = collaborators
        .reclassifier
        .update_color_ramp(&config.layer_name, &config.classification_column)
        .context("reclassify web map")?;
    if !reclassified {
        warn!(webmap = %config.webmap_item_id, "web map color ramp update was refused");
    }

    let stats = RunStats {
        start,
        end: clock.now(),
        download_dir: download_dir.clone(),
        folders_deleted: rotation.report.deleted.len(),
        folders_not_deleted: folders_not_deleted.clone(),
        files_downloaded: files.len(),
        rows_updated,
        reclassified,
    };
    let summary = build_summary(&config.notification.subject_prefix, &stats, log_path);
    collaborators
        .notifier
        .notify(&summary)
        .context("send summary")?;

    if log_path.is_file() {
        let log_blob = log_path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("log path has no file name: {}", log_path.display()))?;
        info!("saving log to cloud storage");
        collaborators
            .archive
            .upload(log_path, log_blob)
            .context("archive log")?;
    } else {
        warn!(path = %log_path.display(), "log file missing; not archived");
    }

    Ok(JobReport {
        download_dir,
        folders_deleted: rotation.report.deleted,
        folders_not_deleted,
        files_downloaded: files.len(),
        rows_updated,
        reclassified,
        summary,
    })
}
