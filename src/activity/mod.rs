// * Crawl Activity
// * Presents one crawl run as a single idempotent operation with a typed,
// * orchestration-friendly failure surface. All retry classification for
// * the run happens here; lower layers raise domain errors freely.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::config::run::{CrawlConfig, CrawlerType, Platform};
use crate::crawler::factory::CrawlerFactory;
use crate::crawler::CrawlerError;
use crate::network::signer::Signer;
use crate::persistence::record::VideoMetadata;
use crate::persistence::store::{find_last_by_aweme_id, JsonBatchStore, StoreError};

// * Closed taxonomy surfaced to the orchestration layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    IdNotFound,
    DataFetchError,
    Other,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::IdNotFound => "ID_NOT_FOUND",
            ErrorType::DataFetchError => "DATA_FETCH_ERROR",
            ErrorType::Other => "OTHER",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// * The typed failure the worker reports back to the orchestrator. The
// * default posture is "assume transient": every taxonomy error is raised
// * retryable and the orchestrator's retry policy decides.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{error_type}: {message}")]
pub struct ApplicationError {
    pub message: String,
    pub non_retryable: bool,
    pub error_type: ErrorType,
}

impl ApplicationError {
    pub fn retryable(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            non_retryable: false,
            error_type,
        }
    }
}

#[derive(Debug, Error)]
pub enum ActivityError {
    // * Run aborted before the retry taxonomy applies: missing/invalid
    // * credential configuration or an unsupported capability. Surfaces
    // * uncaught to the worker runtime.
    #[error("crawl run aborted: {0}")]
    Aborted(#[source] CrawlerError),

    #[error(transparent)]
    Application(#[from] ApplicationError),
}

// * Credential payload supplied by the orchestrator per task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieCredential {
    pub id: i64,
    pub cookie: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
}

pub struct MetadataActivity {
    factory: CrawlerFactory,
    signer: Arc<dyn Signer>,
    credential_file: PathBuf,
    data_root: PathBuf,
}

impl MetadataActivity {
    pub fn new(
        factory: CrawlerFactory,
        signer: Arc<dyn Signer>,
        credential_file: PathBuf,
        data_root: PathBuf,
    ) -> Self {
        Self {
            factory,
            signer,
            credential_file,
            data_root,
        }
    }

    // * The registered activity: fetch metadata for one video id. Runs a
    // * detail-mode crawl with comments and media collection disabled, then
    // * reads the persisted batch back and reshapes the matching record.
    pub async fn get_video_metadata(
        &self,
        video_id: &str,
        credential: &CookieCredential,
    ) -> Result<VideoMetadata, ActivityError> {
        info!(video_id, credential_id = credential.id, "activity started");

        let config = CrawlConfig {
            platform: Platform::Douyin,
            crawler_type: CrawlerType::Detail,
            enable_comments: false,
            enable_media_download: false,
            cookies: credential.cookie.clone(),
            specified_ids: vec![video_id.to_string()],
            credential_file: self.credential_file.clone(),
            data_root: self.data_root.clone(),
            ..CrawlConfig::default()
        };

        // * Construction-phase failures abort outright, never
        // * retry-classified
        let mut crawler = self
            .factory
            .create(&config, self.signer.clone())
            .map_err(ActivityError::Aborted)?;

        let run = crawler.start().await;
        crawler.close().await;
        run.map_err(classify_run_error)?;

        let record = self.load_record(&config, video_id).await?;
        let metadata = VideoMetadata::from_record(&record, video_id);
        info!(video_id, title = %metadata.title, "activity finished");
        Ok(metadata)
    }

    async fn load_record(
        &self,
        config: &CrawlConfig,
        video_id: &str,
    ) -> Result<serde_json::Value, ApplicationError> {
        let store = JsonBatchStore::new(
            config.data_root.clone(),
            config.platform,
            config.crawler_type,
        );

        let items = store.load_contents().await.map_err(|err| match err {
            StoreError::Missing(path) => ApplicationError::retryable(
                ErrorType::IdNotFound,
                format!("batch file not written: {}", path.display()),
            ),
            other => ApplicationError::retryable(ErrorType::Other, other.to_string()),
        })?;

        find_last_by_aweme_id(&items, video_id).cloned().ok_or_else(|| {
            error!(video_id, "no record for requested id in batch file");
            ApplicationError::retryable(
                ErrorType::IdNotFound,
                format!("no metadata found for video id {}", video_id),
            )
        })
    }
}

// * Run-phase classification: network failures are DATA_FETCH_ERROR,
// * everything else OTHER. All retryable.
fn classify_run_error(err: CrawlerError) -> ApplicationError {
    match err {
        CrawlerError::Network(inner) => {
            ApplicationError::retryable(ErrorType::DataFetchError, inner.to_string())
        }
        other => ApplicationError::retryable(ErrorType::Other, other.to_string()),
    }
}
