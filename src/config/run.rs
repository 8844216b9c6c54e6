// * Run Configuration
// * Explicit per-run configuration value threaded through the crawler and
// * activity layers. Never read from ambient global state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::constants::{DEFAULT_USER_AGENT, REQUEST_TIMEOUT_SECS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("credential configuration file not found: {0}")]
    MissingCredentialFile(PathBuf),

    #[error("invalid credential configuration: {0}")]
    InvalidCredential(String),

    #[error("unsupported platform tag: {0}")]
    UnsupportedPlatform(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

// * Closed set of supported platforms. The factory validates its registry
// * against this set at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Douyin,
}

impl Platform {
    pub const ALL: &'static [Platform] = &[Platform::Douyin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Douyin => "douyin",
        }
    }

    // * Accepts both the short CLI tag and the full name
    pub fn from_tag(tag: &str) -> Result<Self, ConfigError> {
        match tag {
            "dy" | "douyin" => Ok(Platform::Douyin),
            other => Err(ConfigError::UnsupportedPlatform(other.to_string())),
        }
    }
}

// * Run modes are mutually exclusive; exactly one is dispatched per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlerType {
    Search,
    Detail,
    Creator,
}

impl CrawlerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlerType::Search => "search",
            CrawlerType::Detail => "detail",
            CrawlerType::Creator => "creator",
        }
    }
}

// * One crawl run's configuration. At most one run's configuration is live
// * in a process at a time; concurrent runs must not share a process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub platform: Platform,
    pub crawler_type: CrawlerType,

    // * Feature toggles
    #[serde(default)]
    pub enable_comments: bool,
    #[serde(default)]
    pub enable_media_download: bool,
    #[serde(default)]
    pub enable_proxy: bool,

    // * Proxy identifiers handed to the round-robin pool when enabled
    #[serde(default)]
    pub proxies: Vec<String>,

    // * Credential payload injected by the activity layer. The browserless
    // * crawler sources its session material from the credential file; this
    // * field carries the orchestration-supplied cookie for run parity.
    #[serde(default)]
    pub cookies: String,

    // * Mode targets
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub specified_ids: Vec<String>,
    #[serde(default)]
    pub creator_ids: Vec<String>,

    // * Bounds
    #[serde(default = "default_max_search_pages")]
    pub max_search_pages: u32,
    #[serde(default = "default_max_comments")]
    pub max_comments_per_item: u32,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    // * Filesystem roots
    #[serde(default = "default_credential_file")]
    pub credential_file: PathBuf,
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
}

fn default_max_search_pages() -> u32 {
    3
}

fn default_max_comments() -> u32 {
    20
}

fn default_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

fn default_credential_file() -> PathBuf {
    PathBuf::from("douyin_cookies_config.json")
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Douyin,
            crawler_type: CrawlerType::Detail,
            enable_comments: false,
            enable_media_download: false,
            enable_proxy: false,
            proxies: Vec::new(),
            cookies: String::new(),
            keywords: Vec::new(),
            specified_ids: Vec::new(),
            creator_ids: Vec::new(),
            max_search_pages: default_max_search_pages(),
            max_comments_per_item: default_max_comments(),
            request_timeout_secs: default_timeout_secs(),
            credential_file: default_credential_file(),
            data_root: default_data_root(),
        }
    }
}

impl CrawlConfig {
    // * Loads a run configuration from a JSON file (standalone runner path)
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

// * Credential configuration file: the session material source for the
// * browserless path. `cookie_string` is mandatory; `user_agent` falls back
// * to the fixed default.
#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub cookie_string: String,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl CookieConfig {
    // * Fails fast: a missing file or an empty/header-unsafe cookie aborts
    // * the run before any network activity.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingCredentialFile(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: CookieConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cookie_string.is_empty() {
            return Err(ConfigError::InvalidCredential(
                "cookie_string is required and must not be empty".to_string(),
            ));
        }
        if self
            .cookie_string
            .bytes()
            .any(|b| !b.is_ascii() || b == b'\r' || b == b'\n')
        {
            return Err(ConfigError::InvalidCredential(
                "cookie_string contains bytes that cannot be sent in a header".to_string(),
            ));
        }
        Ok(())
    }

    pub fn user_agent_or_default(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }
}
