// * Crawler Factory
// * Registry mapping platform tags to constructor functions. The built-in
// * registry is validated at startup against the closed set of supported
// * platforms; tests may register stub constructors.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::run::{ConfigError, CrawlConfig, Platform};
use crate::crawler::browserless::BrowserlessCrawler;
use crate::crawler::{Crawler, CrawlerError};
use crate::network::signer::Signer;

pub type CrawlerCtor =
    Arc<dyn Fn(CrawlConfig, Arc<dyn Signer>) -> Result<Box<dyn Crawler>, CrawlerError> + Send + Sync>;

pub struct CrawlerFactory {
    ctors: HashMap<Platform, CrawlerCtor>,
}

impl CrawlerFactory {
    pub fn empty() -> Self {
        Self {
            ctors: HashMap::new(),
        }
    }

    // * The production registry: every supported platform gets its
    // * browserless constructor
    pub fn with_builtin() -> Self {
        let mut factory = Self::empty();
        factory.register(
            Platform::Douyin,
            Arc::new(|config, signer| {
                Ok(Box::new(BrowserlessCrawler::new(config, signer)?) as Box<dyn Crawler>)
            }),
        );
        factory
    }

    pub fn register(&mut self, platform: Platform, ctor: CrawlerCtor) {
        self.ctors.insert(platform, ctor);
    }

    pub fn supports(&self, platform: Platform) -> bool {
        self.ctors.contains_key(&platform)
    }

    // * Startup validation: the registry must cover the closed platform set
    pub fn validate(&self) -> Result<(), CrawlerError> {
        for platform in Platform::ALL {
            if !self.supports(*platform) {
                return Err(CrawlerError::Config(ConfigError::UnsupportedPlatform(
                    platform.as_str().to_string(),
                )));
            }
        }
        Ok(())
    }

    pub fn create(
        &self,
        config: &CrawlConfig,
        signer: Arc<dyn Signer>,
    ) -> Result<Box<dyn Crawler>, CrawlerError> {
        let ctor = self.ctors.get(&config.platform).ok_or_else(|| {
            CrawlerError::Config(ConfigError::UnsupportedPlatform(
                config.platform.as_str().to_string(),
            ))
        })?;
        ctor(config.clone(), signer)
    }
}
