// * Crawler Layer
// * The crawler capability contract shared by the browser-backed and
// * browserless variants, the platform factory that selects a variant, and
// * the browserless implementation.

pub mod browserless;
pub mod factory;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::run::ConfigError;
use crate::network::errors::NetworkError;
use crate::persistence::store::StoreError;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("session rejected: configured cookie failed the liveness check")]
    SessionRejected,

    #[error("browser launch is not supported in browserless mode")]
    BrowserUnsupported,

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// * One crawl run: construction loads configuration (fail-fast on bad
// * credentials), start() runs exactly one mode to completion. The crawler
// * does not loop or retry; retry policy belongs to the activity layer.
#[async_trait]
pub trait Crawler: Send {
    async fn start(&mut self) -> Result<(), CrawlerError>;

    // * Required by the capability interface; the browserless variant
    // * signals a capability error instead of launching anything.
    async fn launch_browser(&mut self, headless: bool) -> Result<(), CrawlerError>;

    async fn close(&mut self);
}
