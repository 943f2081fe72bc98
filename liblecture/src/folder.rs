use crate::api::ApiClient;
use crate::cache::SessionCache;
use crate::download::download_session;
use crate::errors::Result;
use crate::models::{Folder, Session};
use crate::paths::{normalize, resolve_folder_dir};
use crate::{send_message, LectureConfig, Update};
use tokio::sync::mpsc::Sender;

/// What happened to a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Downloaded,
    /// Already in the session cache, nothing was requested
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FolderSummary {
    pub downloaded: usize,
    pub skipped: usize,
}

/// Walks the configured folders and decides, session by session, what to download.
pub struct Enumerator<'a> {
    client: &'a ApiClient,
    cache: &'a SessionCache,
    config: &'a LectureConfig,
    update_tx: Sender<Update>,
}

impl<'a> Enumerator<'a> {
    pub fn new(
        client: &'a ApiClient,
        cache: &'a SessionCache,
        config: &'a LectureConfig,
        update_tx: Sender<Update>,
    ) -> Self {
        Self {
            client,
            cache,
            config,
            update_tx,
        }
    }

    /// Platform folders whose name is in the allow-list, in the platform's order.
    pub async fn configured_folders(&self) -> Result<Vec<Folder>> {
        let folders = self.client.list_folders().await?;
        let total = folders.len();
        let configured: Vec<Folder> = folders
            .into_iter()
            .filter(|f| self.config.settings.folders.contains(&f.name))
            .collect();
        tracing::debug!("{} of {} folders are configured", configured.len(), total);
        Ok(configured)
    }

    #[tracing::instrument(skip(self))]
    pub async fn process_folder(&self, folder: &Folder) -> Result<FolderSummary> {
        let mut summary = FolderSummary::default();
        for session in self.client.list_sessions(folder).await? {
            match self.process_session(&session).await? {
                SessionOutcome::Downloaded => summary.downloaded += 1,
                SessionOutcome::Skipped => summary.skipped += 1,
            }
        }
        Ok(summary)
    }

    /// Downloads `session` unless it is cached, then records it.
    /// The name is only recorded once the download has completed.
    #[tracing::instrument(skip(self, session), fields(session = %session.session_name))]
    pub async fn process_session(&self, session: &Session) -> Result<SessionOutcome> {
        let name = normalize(&session.session_name);
        if self.cache.is_cached(&name).await? {
            tracing::debug!("{} is cached, skipping", name);
            send_message(&self.update_tx, &name, "skipping".to_string(), false).await;
            return Ok(SessionOutcome::Skipped);
        }

        let dest_dir = resolve_folder_dir(
            &self.config.output_dir,
            &session.folder_name,
            &self.config.settings.aliases,
        )
        .await?;
        let info = self.client.delivery_info(session).await?;

        send_message(&self.update_tx, &name, "downloading".to_string(), false).await;
        let files = download_session(
            self.client,
            session,
            &info,
            &dest_dir,
            &self.config.strategy,
            self.config.progress_update_interval,
            &self.update_tx,
        )
        .await?;
        tracing::debug!("{} file(s) written for {}", files.len(), name);

        self.cache.record(&name).await?;
        Ok(SessionOutcome::Downloaded)
    }
}
