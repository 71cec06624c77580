//! Credentials for the SFTP drop, ArcGIS Online and SendGrid.
//!
//! Deployed jobs read them from a mounted secrets volume; local runs fall back
//! to a `secrets/` folder next to the working directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Root of the secrets volume in deployed containers.
pub const MOUNTED_SECRETS_ROOT: &str = "/secrets";

#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Secrets {
    pub agol_user: String,
    pub agol_password: String,
    pub sftp_host: String,
    pub sftp_username: String,
    pub sftp_password: String,
    pub sftp_folder: String,
    pub sendgrid_api_key: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("agol_user", &self.agol_user)
            .field("agol_password", &"<redacted>")
            .field("sftp_host", &self.sftp_host)
            .field("sftp_username", &self.sftp_username)
            .field("sftp_password", &"<redacted>")
            .field("sftp_folder", &self.sftp_folder)
            .field("sendgrid_api_key", &"<redacted>")
            .finish()
    }
}

/// Where the secrets file is read from, given the two possible roots.
///
/// The mounted root wins whenever it exists, even if its file is missing.
pub fn secrets_path(mounted_root: &Path, local_root: &Path) -> Result<PathBuf> {
    if mounted_root.is_dir() {
        return Ok(mounted_root.join("app").join("secrets.json"));
    }
    let local = local_root.join("secrets");
    if local.is_dir() {
        return Ok(local.join("secrets.json"));
    }
    bail!("secrets folder not found; secrets not loaded");
}

pub fn load_secrets(mounted_root: &Path, local_root: &Path) -> Result<Secrets> {
    let path = secrets_path(mounted_root, local_root)?;
    let contents = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}
