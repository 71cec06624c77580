//! Rotation settings stored as TOML.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::naming::{DEFAULT_DATE_FORMAT, FolderNaming};
use crate::rotate::{DEFAULT_MAX_FOLDER_COUNT, RotationOptions};

/// Rotation configuration (TOML).
///
/// Missing fields take the same defaults as [`RotationOptions::default`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RotatorConfig {
    /// Directory holding the rotated folders. Must already exist.
    pub base_dir: Option<PathBuf>,

    /// Existing folders to keep, not counting the one created.
    pub max_folder_count: usize,

    /// Reuse the new folder if it already exists.
    pub exist_ok: bool,

    pub naming: NamingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NamingConfig {
    /// Literal prefix; include any separator (e.g. `"erap_"`).
    pub prefix: String,

    /// strftime format for the timestamp part.
    pub date_format: String,

    /// Regex recognising earlier folders. Derived from `date_format` if unset
    /// (the default format derives `[0-9]{8}_[0-9]{6}`).
    pub pattern: Option<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            pattern: None,
        }
    }
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            max_folder_count: DEFAULT_MAX_FOLDER_COUNT,
            exist_ok: false,
            naming: NamingConfig::default(),
        }
    }
}

impl NamingConfig {
    pub fn to_naming(&self) -> Result<FolderNaming> {
        let naming = match &self.pattern {
            Some(pattern) => FolderNaming::with_pattern(
                self.prefix.as_str(),
                self.date_format.as_str(),
                pattern.as_str(),
            ),
            None => FolderNaming::new(self.prefix.as_str(), self.date_format.as_str()),
        };
        naming.context("invalid [naming] settings")
    }
}

impl RotatorConfig {
    pub fn validate(&self) -> Result<()> {
        self.naming.to_naming()?;
        Ok(())
    }

    pub fn to_options(&self) -> Result<RotationOptions> {
        Ok(RotationOptions::default()
            .with_naming(self.naming.to_naming()?)
            .exist_ok(self.exist_ok)
            .max_folder_count(self.max_folder_count))
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RotatorConfig::default()`.
pub fn load_config(path: &Path) -> Result<RotatorConfig> {
    if !path.exists() {
        return Ok(RotatorConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RotatorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &RotatorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naming::DEFAULT_PATTERN;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, RotatorConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("rotator.toml");
        let cfg = RotatorConfig {
            base_dir: Some(PathBuf::from("/data/erap")),
            max_folder_count: 4,
            exist_ok: true,
            naming: NamingConfig {
                prefix: "erap_".to_string(),
                date_format: "%Y-%m-%d".to_string(),
                pattern: None,
            },
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("rotator.toml");
        fs::write(&path, "max_folder_count = 3\n[naming]\nprefix = \"erap_\"\n").expect("write");

        let options = load_config(&path).expect("load").to_options().expect("options");

        assert_eq!(options.max_folder_count, 3);
        assert!(!options.exist_ok);
        assert_eq!(options.naming.prefix(), "erap_");
        assert_eq!(options.naming.date_format(), DEFAULT_DATE_FORMAT);
        assert_eq!(options.naming.pattern(), DEFAULT_PATTERN);
    }

    #[test]
    fn drifted_pattern_fails_validation() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("rotator.toml");
        fs::write(
            &path,
            "[naming]\ndate_format = \"%Y-%m-%d\"\npattern = \"[0-9]{8}\"\n",
        )
        .expect("write");

        let err = load_config(&path).expect_err("drift");
        assert!(format!("{err:#}").contains("does not match"));
    }
}
