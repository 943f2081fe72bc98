use crate::api::ApiClient;
use crate::errors::{LectureError, Result};
use crate::models::{DeliveryInfo, Session};
use crate::paths::session_file;
use crate::Update::ProgressUpdate;
use crate::{Progress, Update};
use reqwest::header;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio::time::Instant;

/// Program used for stream extraction unless configured otherwise
pub const DEFAULT_EXTRACTOR: &str = "yt-dlp";

/// How a session's video is fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DownloadStrategy {
    /// GET the delivery's download url, one file per session
    #[default]
    Direct,
    /// Hand every stream of the delivery to an external extractor, one file per stream
    StreamExtraction { program: String },
}

/// Fetches a session's video into `dest_dir`. Returns the written files.
#[tracing::instrument(skip(client, info, update_tx))]
pub async fn download_session(
    client: &ApiClient,
    session: &Session,
    info: &DeliveryInfo,
    dest_dir: &Path,
    strategy: &DownloadStrategy,
    progress_update_interval: u64,
    update_tx: &Sender<Update>,
) -> Result<Vec<PathBuf>> {
    match strategy {
        DownloadStrategy::Direct => {
            let download_url = match &info.download_url {
                Some(u) => u,
                None => {
                    tracing::error!("No download url for {}", session.session_name);
                    return Err(LectureError::UnexpectedPayload {
                        endpoint: crate::api::DELIVERY_INFO_ENDPOINT.to_string(),
                        message: format!("missing DownloadUrl for {}", session.delivery_id),
                    });
                }
            };
            let dest = session_file(dest_dir, &session.session_name, None);
            download_direct(client, download_url, &dest, progress_update_interval, update_tx)
                .await?;
            Ok(vec![dest])
        }
        DownloadStrategy::StreamExtraction { program } => {
            let mut files = Vec::with_capacity(info.streams().len());
            for (i, stream) in info.streams().iter().enumerate() {
                let dest = session_file(dest_dir, &session.session_name, Some(i));
                extract_stream(program, &stream.stream_url, &dest).await?;
                files.push(dest);
            }
            if files.is_empty() {
                tracing::warn!("Delivery of {} has no streams", session.session_name);
            }
            Ok(files)
        }
    }
}

/// Streams the body of `url` into `dest`, truncating whatever was there.
async fn download_direct(
    client: &ApiClient,
    url: &str,
    dest: &Path,
    progress_update_interval: u64,
    update_tx: &Sender<Update>,
) -> Result<u64> {
    let mut response = client.get(url).await?;
    if !response.status().is_success() {
        tracing::error!("Error status code received : {} |{}|", response.status(), url);
        return Err(LectureError::ErrorStatusCode {
            status_code: response.status().to_string(),
            url: url.to_string(),
        });
    }

    let f_size = match response.headers().get(header::CONTENT_LENGTH) {
        None => 0u64,
        Some(s) => s
            .to_str()
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0u64),
    };

    let mut dest_file = match OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dest)
        .await
    {
        Err(e) => {
            tracing::error!("Error opening/creating file {}", dest.to_string_lossy());
            tracing::error!("{} | {}", e, e.kind());
            return Err(LectureError::file_op(dest, e));
        }
        Ok(f) => f,
    };

    let resource_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let progress_update_interval = Duration::from_millis(progress_update_interval);
    let mut last_update_time = Instant::now() - progress_update_interval;
    let mut bytes_written = 0u64;

    while let Some(chunk) = response.chunk().await.map_err(|e| {
        tracing::error!("Error downloading resource from {}", url);
        tracing::error!("{}", e);
        LectureError::NetworkError(e.to_string())
    })? {
        if let Err(e) = dest_file.write_all(&chunk).await {
            tracing::error!("Error writing to destination file {}", dest.to_string_lossy());
            tracing::error!("{} | {}", e, e.kind());
            return Err(LectureError::file_op(dest, e));
        }
        bytes_written += chunk.len() as u64;
        if Instant::now().duration_since(last_update_time) > progress_update_interval {
            if let Err(e) = update_tx.try_send(ProgressUpdate(Progress {
                bytes_written,
                file_size: f_size,
                resource_name: resource_name.clone(),
            })) {
                if let TrySendError::Closed(_) = e {
                    return Err(LectureError::ChannelClosed);
                }
            } else {
                last_update_time = Instant::now();
            }
        }
    }
    if let Err(e) = dest_file.flush().await {
        return Err(LectureError::file_op(dest, e));
    }

    tracing::debug!("Download completed for {}, file @ {}", url, dest.to_string_lossy());
    if (update_tx
        .send(ProgressUpdate(Progress {
            bytes_written,
            file_size: if f_size == 0 { bytes_written } else { f_size },
            resource_name,
        }))
        .await)
        .is_err()
    {};
    Ok(bytes_written)
}

pub(crate) fn extractor_args(dest: &Path, stream_url: &str) -> Vec<OsString> {
    vec![
        OsString::from("--quiet"),
        OsString::from("-o"),
        dest.as_os_str().to_owned(),
        OsString::from(stream_url),
    ]
}

async fn extract_stream(program: &str, stream_url: &str, dest: &Path) -> Result<()> {
    tracing::debug!("Extracting {} to {} with {}", stream_url, dest.to_string_lossy(), program);
    let status = Command::new(program)
        .args(extractor_args(dest, stream_url))
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|e| {
            tracing::error!("Failed to run {} : {}", program, e);
            LectureError::ExtractorFailed {
                program: program.to_string(),
                message: format!("{} | {}", e, e.kind()),
            }
        })?;
    if !status.success() {
        tracing::error!("{} exited with {} for {}", program, status, stream_url);
        return Err(LectureError::ExtractorFailed {
            program: program.to_string(),
            message: format!("{status} for {stream_url}"),
        });
    }
    Ok(())
}
