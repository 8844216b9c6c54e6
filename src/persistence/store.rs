// * Dated JSON Batch Store
// * All records crawled on a given day accumulate in one JSON array file
// * per run mode: <root>/<platform>/json/<mode>_contents_<YYYY-MM-DD>.json.
// * Appends are read-modify-write over the whole array; a run appends and
// * the activity layer later re-reads.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::run::{CrawlerType, Platform};
use crate::ops::telemetry;
use crate::persistence::record::VideoMetadata;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("batch file not found: {0}")]
    Missing(PathBuf),

    #[error("batch file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("batch file is not a JSON array: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub struct JsonBatchStore {
    root: PathBuf,
    platform: Platform,
    crawler_type: CrawlerType,
}

impl JsonBatchStore {
    pub fn new(root: PathBuf, platform: Platform, crawler_type: CrawlerType) -> Self {
        Self {
            root,
            platform,
            crawler_type,
        }
    }

    fn json_dir(&self) -> PathBuf {
        self.root.join(self.platform.as_str()).join("json")
    }

    fn dated_path(&self, kind: &str) -> PathBuf {
        let date = chrono::Local::now().format("%Y-%m-%d");
        self.json_dir()
            .join(format!("{}_{}_{}.json", self.crawler_type.as_str(), kind, date))
    }

    pub fn contents_path(&self) -> PathBuf {
        self.dated_path("contents")
    }

    pub fn comments_path(&self) -> PathBuf {
        self.dated_path("comments")
    }

    fn media_dir(&self, aweme_id: &str) -> PathBuf {
        self.root
            .join(self.platform.as_str())
            .join("media")
            .join(aweme_id)
    }

    async fn read_array(path: &Path) -> Result<Vec<Value>, StoreError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn append(&self, path: &Path, entries: Vec<Value>) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut batch = if path.exists() {
            Self::read_array(path).await?
        } else {
            Vec::new()
        };
        batch.extend(entries);
        tokio::fs::write(path, serde_json::to_vec_pretty(&batch)?).await?;
        Ok(())
    }

    // * Appends one flattened record to today's contents batch
    pub async fn save_content(&self, record: &VideoMetadata) -> Result<(), StoreError> {
        let entry = serde_json::to_value(record)?;
        let path = self.contents_path();
        self.append(&path, vec![entry]).await?;
        telemetry::record_stored("content");
        debug!(aweme_id = %record.aweme_id, path = %path.display(), "record persisted");
        Ok(())
    }

    // * Appends a page of raw comment payloads to today's comments batch
    pub async fn save_comments(&self, comments: Vec<Value>) -> Result<(), StoreError> {
        if comments.is_empty() {
            return Ok(());
        }
        let count = comments.len();
        self.append(&self.comments_path(), comments).await?;
        for _ in 0..count {
            telemetry::record_stored("comment");
        }
        Ok(())
    }

    // * Writes one downloaded media object under the record's media dir
    pub async fn save_media(
        &self,
        aweme_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        let dir = self.media_dir(aweme_id);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(file_name), bytes).await?;
        telemetry::record_stored("media");
        Ok(())
    }

    // * Read side used by the activity: the full contents batch for today
    pub async fn load_contents(&self) -> Result<Vec<Value>, StoreError> {
        let path = self.contents_path();
        if !path.exists() {
            return Err(StoreError::Missing(path));
        }
        Self::read_array(&path).await
    }
}

// * Scans the full batch; when duplicate identifiers appear, the last
// * matching entry in file order wins.
pub fn find_last_by_aweme_id<'a>(items: &'a [Value], aweme_id: &str) -> Option<&'a Value> {
    items
        .iter()
        .filter(|item| item.get("aweme_id").and_then(Value::as_str) == Some(aweme_id))
        .next_back()
}
