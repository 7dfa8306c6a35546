//! Retrieval pipeline: identifier -> metadata -> download -> dispatch
//!
//! Each call to [`RetrievalPipeline::retrieve`] owns a fresh
//! [`RetrievalSession`]; nothing is shared between invocations.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::fmt;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::dispatch::{
    CommandShareSheet, DirectoryGallery, DispatchResult, MediaGallery, Platform,
    PlatformDispatcher, ShareSheet,
};
use crate::download::{DownloadMetadata, LocalArtifact, MetadataFetcher, ResumableDownloader};
use crate::error::RetrievalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStage {
    Pending,
    FetchingMetadata,
    Downloading,
    Dispatching,
    Completed,
    Failed,
}

impl fmt::Display for RetrievalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalStage::Pending => write!(f, "pending"),
            RetrievalStage::FetchingMetadata => write!(f, "fetching_metadata"),
            RetrievalStage::Downloading => write!(f, "downloading"),
            RetrievalStage::Dispatching => write!(f, "dispatching"),
            RetrievalStage::Completed => write!(f, "completed"),
            RetrievalStage::Failed => write!(f, "failed"),
        }
    }
}

/// State of one retrieval, filled in as each stage completes
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalSession {
    pub file_id: String,
    pub stage: RetrievalStage,
    pub started_at: DateTime<Utc>,
    pub metadata: Option<DownloadMetadata>,
    pub artifact: Option<LocalArtifact>,
    pub outcome: Option<DispatchResult>,
}

impl RetrievalSession {
    fn new(file_id: &str) -> Self {
        Self {
            file_id: file_id.trim().to_string(),
            stage: RetrievalStage::Pending,
            started_at: Utc::now(),
            metadata: None,
            artifact: None,
            outcome: None,
        }
    }

    fn move_to(&mut self, stage: RetrievalStage) {
        info!("retrieval {}: {} -> {}", self.file_id, self.stage, stage);
        self.stage = stage;
    }
}

pub struct RetrievalPipeline<G, S> {
    metadata: MetadataFetcher,
    downloader: ResumableDownloader,
    dispatcher: PlatformDispatcher<G, S>,
    platform: Platform,
}

impl RetrievalPipeline<DirectoryGallery, CommandShareSheet> {
    pub fn from_config(api: ApiClient, config: &ClientConfig) -> Self {
        Self::new(
            MetadataFetcher::new(api.clone()),
            ResumableDownloader::new(api, &config.download_dir),
            PlatformDispatcher::from_config(config),
            config.resolved_platform(),
        )
    }
}

impl<G: MediaGallery, S: ShareSheet> RetrievalPipeline<G, S> {
    pub fn new(
        metadata: MetadataFetcher,
        downloader: ResumableDownloader,
        dispatcher: PlatformDispatcher<G, S>,
        platform: Platform,
    ) -> Self {
        Self {
            metadata,
            downloader,
            dispatcher,
            platform,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Run every stage in order; the first failure ends the retrieval.
    pub async fn retrieve(&self, file_id: &str) -> Result<RetrievalSession, RetrievalError> {
        let mut session = RetrievalSession::new(file_id);
        match self.run_stages(&mut session).await {
            Ok(()) => {
                let elapsed = Utc::now() - session.started_at;
                session.move_to(RetrievalStage::Completed);
                info!(
                    "retrieval {}: finished in {} ms",
                    session.file_id,
                    elapsed.num_milliseconds()
                );
                Ok(session)
            }
            Err(e) => {
                warn!("retrieval {}: failed during {}: {}", session.file_id, session.stage, e);
                session.move_to(RetrievalStage::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages(&self, session: &mut RetrievalSession) -> Result<(), RetrievalError> {
        session.move_to(RetrievalStage::FetchingMetadata);
        let metadata = self.metadata.fetch_metadata(&session.file_id).await?;

        session.move_to(RetrievalStage::Downloading);
        let artifact = self.downloader.download(&metadata.filename).await?;
        session.metadata = Some(metadata);

        session.move_to(RetrievalStage::Dispatching);
        let outcome = self.dispatcher.dispatch(&artifact, self.platform).await?;
        session.artifact = Some(artifact);
        session.outcome = Some(outcome);
        Ok(())
    }
}
