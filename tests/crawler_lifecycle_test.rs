use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aweme_flow::config::run::{ConfigError, CrawlConfig};
use aweme_flow::crawler::browserless::BrowserlessCrawler;
use aweme_flow::crawler::{Crawler, CrawlerError};
use aweme_flow::network::client::{BrowserlessClient, PlatformSession};
use aweme_flow::network::identity::SessionIdentity;
use aweme_flow::network::signer::{SignatureError, Signer};

struct CountingSigner {
    calls: AtomicUsize,
}

impl CountingSigner {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Signer for CountingSigner {
    async fn sign(&self, _: &str, _: &str, _: &str) -> Result<String, SignatureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("token".to_string())
    }
}

fn credential_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn missing_credential_file_is_fatal_before_any_network_call() {
    let signer = CountingSigner::new();
    let config = CrawlConfig {
        credential_file: PathBuf::from("/nonexistent/douyin_cookies_config.json"),
        ..CrawlConfig::default()
    };

    let err = BrowserlessCrawler::new(config, signer.clone()).unwrap_err();
    assert!(matches!(
        err,
        CrawlerError::Config(ConfigError::MissingCredentialFile(_))
    ));
    // * Construction failed before the signature provider could be touched
    assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn credential_without_cookie_is_fatal() {
    let signer = CountingSigner::new();
    let file = credential_file(r#"{"user_agent": "TestAgent/1.0"}"#);
    let config = CrawlConfig {
        credential_file: file.path().to_path_buf(),
        ..CrawlConfig::default()
    };

    let err = BrowserlessCrawler::new(config, signer.clone()).unwrap_err();
    assert!(matches!(err, CrawlerError::Config(_)));
    assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn launch_browser_signals_capability_error() {
    let file = credential_file(r#"{"cookie_string": "sessionid=abc"}"#);
    let config = CrawlConfig {
        credential_file: file.path().to_path_buf(),
        ..CrawlConfig::default()
    };
    let mut crawler = BrowserlessCrawler::new(config, CountingSigner::new()).unwrap();

    assert!(matches!(
        crawler.launch_browser(true).await,
        Err(CrawlerError::BrowserUnsupported)
    ));
    assert!(matches!(
        crawler.launch_browser(false).await,
        Err(CrawlerError::BrowserUnsupported)
    ));
}

#[tokio::test]
async fn liveness_check_is_the_documented_always_true_stub() {
    // * The browserless liveness check asserts rather than probes; this
    // * test pins the stubbed contract so a real probe is a deliberate,
    // * visible change.
    let identity = SessionIdentity::new(
        "sessionid=abc".to_string(),
        "TestAgent/1.0".to_string(),
    );
    let client = BrowserlessClient::new(
        Duration::from_secs(5),
        None,
        identity,
        CountingSigner::new(),
        None,
    )
    .unwrap();

    assert!(client.pong().await.unwrap());
    assert!(!client.has_browser_page());
}
