pub mod constants;
pub mod run;

pub use run::{ConfigError, CookieConfig, CrawlConfig, CrawlerType, Platform};
