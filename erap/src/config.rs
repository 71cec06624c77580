//! Job configuration stored as TOML.
//!
//! Secrets live elsewhere (see [`crate::secrets`]); this file only holds
//! identifiers and settings that are safe to commit.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rotator::core::naming::DEFAULT_DATE_FORMAT;
use rotator::io::config::{NamingConfig, RotatorConfig};
use rotator::rotate::DEFAULT_MAX_FOLDER_COUNT;
use serde::{Deserialize, Serialize};

/// ERAP job configuration (TOML).
///
/// Missing fields default to the production layer and map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JobConfig {
    /// ArcGIS Online organisation URL.
    pub agol_org: String,

    /// Hosted feature layer updated with the new values.
    pub feature_layer_item_id: String,

    /// Web map whose color ramp is reclassified.
    pub webmap_item_id: String,

    /// Layer in the web map that carries the color ramp.
    pub layer_name: String,

    /// CSV file expected in the SFTP folder.
    pub file_name: String,

    /// Column joining CSV rows to existing features.
    pub key_column: String,

    /// Column the color ramp breaks are computed from.
    pub classification_column: String,

    /// Fields written to the feature layer.
    pub update_fields: Vec<String>,

    /// Base name of the per-run log file.
    pub log_name: String,

    /// Bucket for archived CSVs and logs; expected to carry an age-based
    /// retention policy.
    pub storage_bucket: String,

    /// Default tracing directive when `RUST_LOG` is unset.
    pub log_level: String,

    pub notification: NotificationConfig,

    pub download: DownloadConfig,
}

/// Rotated download folders on local or mounted storage.
///
/// Flat `[download]` table; any key left out keeps the job's default, so a
/// table holding only `base_dir` still rotates `erap_`-prefixed folders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DownloadConfig {
    pub base_dir: Option<PathBuf>,
    pub max_folder_count: usize,
    pub exist_ok: bool,
    pub prefix: String,
    pub date_format: String,
    pub pattern: Option<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            max_folder_count: DEFAULT_MAX_FOLDER_COUNT,
            exist_ok: false,
            prefix: "erap_".to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            pattern: None,
        }
    }
}

impl DownloadConfig {
    pub fn to_rotator_config(&self) -> RotatorConfig {
        RotatorConfig {
            base_dir: self.base_dir.clone(),
            max_folder_count: self.max_folder_count,
            exist_ok: self.exist_ok,
            naming: NamingConfig {
                prefix: self.prefix.clone(),
                date_format: self.date_format.clone(),
                pattern: self.pattern.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationConfig {
    pub from_address: String,
    pub to_addresses: Vec<String>,
    /// Prepended to every subject line.
    pub subject_prefix: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            from_address: "noreply@utah.gov".to_string(),
            to_addresses: vec!["jdadams@utah.gov".to_string()],
            subject_prefix: "ERAP: ".to_string(),
        }
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            agol_org: "https://utah.maps.arcgis.com".to_string(),
            feature_layer_item_id: "32f9c17b1ed04157a8a9a0a635f36c64".to_string(),
            webmap_item_id: "c14586a1117e4fd1a0865ffa9e3a9a37".to_string(),
            layer_name: "Aggregate Paid Rental Assistance Applications".to_string(),
            file_name: "ERAP_PAYMENTS.csv".to_string(),
            key_column: "zip5".to_string(),
            classification_column: "Amount".to_string(),
            update_fields: ["zip5", "Count_", "Amount", "Updated"]
                .into_iter()
                .map(String::from)
                .collect(),
            log_name: "log".to_string(),
            storage_bucket: "ut-dts-agrc-erap-dev-data".to_string(),
            log_level: "erap=debug,rotator=debug".to_string(),
            notification: NotificationConfig::default(),
            download: DownloadConfig::default(),
        }
    }
}

impl JobConfig {
    pub fn validate(&self) -> Result<()> {
        if self.file_name.trim().is_empty() {
            bail!("file_name must not be empty");
        }
        if !self.update_fields.contains(&self.key_column) {
            bail!("key_column `{}` must be one of update_fields", self.key_column);
        }
        if !self.update_fields.contains(&self.classification_column) {
            bail!(
                "classification_column `{}` must be one of update_fields",
                self.classification_column
            );
        }
        if self.notification.to_addresses.is_empty() {
            bail!("notification.to_addresses must not be empty");
        }
        if self.download.base_dir.is_none() {
            bail!("download.base_dir must be set");
        }
        self.download
            .to_rotator_config()
            .validate()
            .context("invalid [download] settings")?;
        Ok(())
    }
}

/// Load and validate job config from a TOML file.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: JobConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
