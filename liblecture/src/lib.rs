use crate::api::ApiClient;
use crate::cache::SessionCache;
use crate::folder::Enumerator;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tokio::sync::mpsc::Sender;
use tracing::instrument;

pub mod api;
pub mod cache;
pub mod download;
mod errors;
pub mod folder;
pub mod models;
pub mod paths;

pub use download::{DownloadStrategy, DEFAULT_EXTRACTOR};
pub use errors::{LectureError, Result};

/// Default progress update interval in milliseconds
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// User settings, usually read from settings.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Remote folder name to local directory name
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    /// Remote folders to download. Anything else is ignored.
    #[serde(default)]
    pub folders: HashSet<String>,
}

/// Everything a run needs, resolved up front and never changed afterwards.
#[derive(Debug, Clone)]
pub struct LectureConfig {
    /// Value of the `.ASPXAUTH` cookie
    pub token: String,
    /// E.g https://york.cloud.panopto.eu
    pub base_url: String,
    pub output_dir: PathBuf,
    /// Directory holding the session cache file
    pub cache_dir: PathBuf,
    pub strategy: DownloadStrategy,
    pub settings: Settings,
    /// Progress update interval in millisecond
    pub progress_update_interval: u64,
}

#[derive(Debug)]
pub enum Update {
    MessageUpdate(Message),
    ProgressUpdate(Progress),
}

#[derive(Debug)]
pub struct Message {
    pub content: String,
    pub resource_name: String,
    pub is_error: bool,
}

#[derive(Debug)]
pub struct Progress {
    pub bytes_written: u64,
    /// 0 when the server didn't tell us
    pub file_size: u64,
    pub resource_name: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Configured folders found on the platform
    pub folders: usize,
    pub downloaded: usize,
    pub skipped: usize,
}

/// Sends a message, a closed channel only means nobody is listening.
pub(crate) async fn send_message(
    update_tx: &Sender<Update>,
    resource_name: &str,
    content: String,
    is_error: bool,
) {
    if (update_tx
        .send(Update::MessageUpdate(Message {
            content,
            resource_name: resource_name.to_string(),
            is_error,
        }))
        .await)
        .is_err()
    {};
}

/// Downloads every session of the configured folders that isn't cached yet.
///
/// Folders and sessions are processed one at a time in the order the platform
/// returns them. The first error aborts the run.
#[instrument(skip(config, update_tx), fields(base_url = %config.base_url))]
pub async fn run(config: &LectureConfig, update_tx: Sender<Update>) -> Result<RunSummary> {
    check_preconditions(config)?;
    if let Err(e) = tokio::fs::create_dir_all(&config.cache_dir).await {
        tracing::error!("Failed to create cache directory\nError : {}", e);
        return Err(LectureError::file_op(&config.cache_dir, e));
    }

    let client = ApiClient::new(&config.base_url, &config.token)?.with_updates(update_tx.clone());
    let cache = SessionCache::new(&config.cache_dir);
    let enumerator = Enumerator::new(&client, &cache, config, update_tx);

    let mut summary = RunSummary::default();
    for folder in enumerator.configured_folders().await? {
        summary.folders += 1;
        let folder_summary = enumerator.process_folder(&folder).await?;
        summary.downloaded += folder_summary.downloaded;
        summary.skipped += folder_summary.skipped;
    }
    tracing::debug!("Run finished {:?}", summary);
    Ok(summary)
}

fn check_preconditions(config: &LectureConfig) -> Result<()> {
    if config.token.trim().is_empty() {
        return Err(LectureError::MissingPrecondition("token".to_string()));
    }
    if config.base_url.trim().is_empty() {
        return Err(LectureError::MissingPrecondition("base url".to_string()));
    }
    if config.output_dir.as_os_str().is_empty() {
        return Err(LectureError::MissingPrecondition(
            "output directory".to_string(),
        ));
    }
    if config.cache_dir.as_os_str().is_empty() {
        return Err(LectureError::MissingPrecondition(
            "cache directory".to_string(),
        ));
    }
    Ok(())
}
