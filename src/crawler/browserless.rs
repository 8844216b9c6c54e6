// * Browserless Crawler
// * Runs one crawl (search / detail / creator) over pure HTTP. Session
// * material comes from the credential file; the per-run nonce is minted at
// * construction. Liveness is checked before any mode is dispatched.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::run::{CookieConfig, CrawlConfig, CrawlerType};
use crate::crawler::{Crawler, CrawlerError};
use crate::network::client::{BrowserlessClient, PlatformSession};
use crate::network::identity::SessionIdentity;
use crate::network::proxy::ProxyPool;
use crate::network::signer::Signer;
use crate::ops::telemetry;
use crate::persistence::record::VideoMetadata;
use crate::persistence::store::JsonBatchStore;

// * Page sizes the web client uses
const SEARCH_PAGE_SIZE: u32 = 10;
const CREATOR_PAGE_SIZE: u32 = 35;
const COMMENT_PAGE_SIZE: u32 = 20;

pub struct BrowserlessCrawler {
    config: CrawlConfig,
    identity: SessionIdentity,
    signer: Arc<dyn Signer>,
    proxy_pool: Option<Arc<ProxyPool>>,
    store: JsonBatchStore,
}

impl std::fmt::Debug for BrowserlessCrawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserlessCrawler").finish_non_exhaustive()
    }
}

impl BrowserlessCrawler {
    // * Uninitialized -> ConfigLoaded: reads the credential file and mints
    // * the per-run session nonce. Fails fast, no retry, when the file is
    // * absent or the cookie is unusable.
    pub fn new(config: CrawlConfig, signer: Arc<dyn Signer>) -> Result<Self, CrawlerError> {
        let cookie_config = CookieConfig::load(&config.credential_file)?;
        let identity = SessionIdentity::new(
            cookie_config.cookie_string.clone(),
            cookie_config.user_agent_or_default(),
        );
        info!(
            nonce_preview = &identity.ms_token[..20],
            "credential configuration loaded, session nonce minted"
        );

        let proxy_pool = if config.enable_proxy && !config.proxies.is_empty() {
            Some(Arc::new(ProxyPool::new(config.proxies.clone())))
        } else {
            None
        };

        let store = JsonBatchStore::new(
            config.data_root.clone(),
            config.platform,
            config.crawler_type,
        );

        Ok(Self {
            config,
            identity,
            signer,
            proxy_pool,
            store,
        })
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    // * ConfigLoaded -> Started: acquire a proxy when enabled, build the
    // * client
    async fn build_client(&self) -> Result<BrowserlessClient, CrawlerError> {
        let proxy = match &self.proxy_pool {
            Some(pool) => pool.acquire().await,
            None => None,
        };
        if let Some(proxy) = proxy.as_deref() {
            info!(proxy, "proxy acquired for run");
        }

        Ok(BrowserlessClient::new(
            Duration::from_secs(self.config.request_timeout_secs),
            proxy,
            self.identity.clone(),
            self.signer.clone(),
            self.proxy_pool.clone(),
        )?)
    }

    async fn run_detail(&self, client: &BrowserlessClient) -> Result<(), CrawlerError> {
        for aweme_id in &self.config.specified_ids {
            let item = client.get_video_by_id(aweme_id).await?;
            let record = VideoMetadata::from_aweme(&item, None);
            self.store.save_content(&record).await?;

            if self.config.enable_comments {
                self.collect_comments(client, aweme_id).await?;
            }
            if self.config.enable_media_download {
                self.download_media(client, &record).await?;
            }
        }
        Ok(())
    }

    async fn run_search(&self, client: &BrowserlessClient) -> Result<(), CrawlerError> {
        for keyword in &self.config.keywords {
            info!(keyword, "search mode: crawling keyword");
            for page in 0..self.config.max_search_pages {
                let payload = client
                    .search_by_keyword(keyword, page * SEARCH_PAGE_SIZE, SEARCH_PAGE_SIZE)
                    .await?;

                let items = payload
                    .get("data")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                for entry in &items {
                    // * General search interleaves non-video entries; only
                    // * entries carrying an aweme payload are records
                    if let Some(item) = entry.get("aweme_info") {
                        let record = VideoMetadata::from_aweme(item, Some(keyword));
                        self.store.save_content(&record).await?;
                    }
                }

                if !truthy(payload.get("has_more")) {
                    break;
                }
            }
        }
        Ok(())
    }

    async fn run_creator(&self, client: &BrowserlessClient) -> Result<(), CrawlerError> {
        for sec_user_id in &self.config.creator_ids {
            info!(sec_user_id, "creator mode: crawling posts");
            let mut max_cursor = 0i64;
            loop {
                let payload = client
                    .get_user_posts(sec_user_id, max_cursor, CREATOR_PAGE_SIZE)
                    .await?;

                let posts = payload
                    .get("aweme_list")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                if posts.is_empty() {
                    break;
                }
                for item in &posts {
                    let record = VideoMetadata::from_aweme(item, None);
                    self.store.save_content(&record).await?;
                }

                if !truthy(payload.get("has_more")) {
                    break;
                }
                max_cursor = payload
                    .get("max_cursor")
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
            }
        }
        Ok(())
    }

    async fn collect_comments(
        &self,
        client: &BrowserlessClient,
        aweme_id: &str,
    ) -> Result<(), CrawlerError> {
        let mut cursor = 0i64;
        let mut collected = 0u32;
        while collected < self.config.max_comments_per_item {
            let payload = client.get_comments(aweme_id, cursor, COMMENT_PAGE_SIZE).await?;
            let comments = payload
                .get("comments")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if comments.is_empty() {
                break;
            }
            collected += comments.len() as u32;
            self.store.save_comments(comments).await?;

            if !truthy(payload.get("has_more")) {
                break;
            }
            cursor = payload.get("cursor").and_then(Value::as_i64).unwrap_or(0);
        }
        Ok(())
    }

    async fn download_media(
        &self,
        client: &BrowserlessClient,
        record: &VideoMetadata,
    ) -> Result<(), CrawlerError> {
        let targets = [
            (record.cover_url.as_deref(), "cover.jpg"),
            (record.video_download_url.as_deref(), "video.mp4"),
            (record.music_download_url.as_deref(), "music.mp3"),
        ];
        for (url, file_name) in targets {
            let Some(url) = url else { continue };
            match client.download_bytes(url).await {
                Ok(bytes) => {
                    self.store
                        .save_media(&record.aweme_id, file_name, &bytes)
                        .await?;
                }
                // * A missing media object does not fail the run
                Err(err) => warn!(
                    aweme_id = %record.aweme_id,
                    file_name,
                    error = %err,
                    "media download skipped"
                ),
            }
        }
        Ok(())
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    }
}

#[async_trait]
impl Crawler for BrowserlessCrawler {
    // * Started -> Running -> Finished: liveness gate, then exactly one of
    // * the three mutually exclusive run modes.
    async fn start(&mut self) -> Result<(), CrawlerError> {
        let mode = self.config.crawler_type.as_str();
        info!(mode, "browserless crawl run starting (pure HTTP mode)");

        let client = self.build_client().await?;

        if !client.pong().await? {
            telemetry::record_crawl_run(mode, "session_rejected");
            return Err(CrawlerError::SessionRejected);
        }

        let run = match self.config.crawler_type {
            CrawlerType::Search => self.run_search(&client).await,
            CrawlerType::Detail => self.run_detail(&client).await,
            CrawlerType::Creator => self.run_creator(&client).await,
        };

        match &run {
            Ok(()) => {
                telemetry::record_crawl_run(mode, "ok");
                info!(mode, "crawl run finished");
            }
            Err(err) => {
                telemetry::record_crawl_run(mode, "error");
                warn!(mode, error = %err, "crawl run failed");
            }
        }
        run
    }

    async fn launch_browser(&mut self, _headless: bool) -> Result<(), CrawlerError> {
        Err(CrawlerError::BrowserUnsupported)
    }

    async fn close(&mut self) {
        info!("browserless crawler closed");
    }
}
