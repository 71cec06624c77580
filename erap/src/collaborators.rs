//! Remote services the job talks to.
//!
//! Each trait covers one service; implementations hold their own
//! credentials and connections.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::records::PaymentRecord;
use crate::summary::SummaryMessage;

/// The SFTP drop the payment CSV is published to.
pub trait SftpSource {
    /// Copy every file in the remote folder into `dest`, returning the local
    /// paths written.
    fn download_folder(&self, dest: &Path) -> Result<Vec<PathBuf>>;
}

/// Bucket keeping copies of each run's data and log.
pub trait ArchiveStore {
    fn upload(&self, local: &Path, blob_name: &str) -> Result<()>;
}

/// Hosted feature layer holding one feature per ZIP code.
pub trait FeatureLayerUpdater {
    /// Overwrite `fields` on the features whose `key_column` matches a
    /// record; returns the number of rows updated.
    fn update_existing(
        &self,
        item_id: &str,
        key_column: &str,
        fields: &[String],
        records: &[PaymentRecord],
    ) -> Result<usize>;
}

/// Web map whose color ramp follows the data.
pub trait MapReclassifier {
    /// Recompute class breaks for `layer_name` from `column`; `Ok(false)`
    /// means the service refused the update.
    fn update_color_ramp(&self, layer_name: &str, column: &str) -> Result<bool>;
}

pub trait Notifier {
    fn notify(&self, message: &SummaryMessage) -> Result<()>;
}
