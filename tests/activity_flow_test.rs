use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use aweme_flow::activity::{
    ActivityError, CookieCredential, ErrorType, MetadataActivity,
};
use aweme_flow::config::run::Platform;
use aweme_flow::crawler::factory::CrawlerFactory;
use aweme_flow::crawler::{Crawler, CrawlerError};
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

// * Stands in for a crawl run whose output is already on disk
struct SeededCrawler;

#[async_trait]
impl Crawler for SeededCrawler {
    async fn start(&mut self) -> Result<(), CrawlerError> {
        Ok(())
    }

    async fn launch_browser(&mut self, _headless: bool) -> Result<(), CrawlerError> {
        Err(CrawlerError::BrowserUnsupported)
    }

    async fn close(&mut self) {}
}

fn stubbed_factory() -> CrawlerFactory {
    let mut factory = CrawlerFactory::empty();
    factory.register(
        Platform::Douyin,
        Arc::new(|_, _| Ok(Box::new(SeededCrawler) as Box<dyn Crawler>)),
    );
    factory
}

fn credential() -> CookieCredential {
    CookieCredential {
        id: 1,
        cookie: "sessionid=abc".to_string(),
        user_agent: "TestAgent/1.0".to_string(),
    }
}

// * Today's detail contents batch path under the given data root
fn batch_path(data_root: &Path) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d");
    data_root
        .join("douyin")
        .join("json")
        .join(format!("detail_contents_{}.json", date))
}

fn seed_batch(data_root: &Path, contents: &str) {
    let path = batch_path(data_root);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}

fn activity(data_root: &Path, signer: Arc<dyn Signer>) -> MetadataActivity {
    MetadataActivity::new(
        stubbed_factory(),
        signer,
        data_root.join("douyin_cookies_config.json"),
        data_root.to_path_buf(),
    )
}

#[tokio::test]
async fn returns_the_matching_record() {
    let dir = tempfile::tempdir().unwrap();
    seed_batch(dir.path(), r#"[{"aweme_id": "777", "title": "T"}]"#);

    let metadata = activity(dir.path(), CountingSigner::new())
        .get_video_metadata("777", &credential())
        .await
        .unwrap();

    assert_eq!(metadata.aweme_id, "777");
    assert_eq!(metadata.title, "T");
    assert!(metadata.raw_metadata.is_some());
}

#[tokio::test]
async fn missing_id_maps_to_retryable_id_not_found() {
    let dir = tempfile::tempdir().unwrap();
    seed_batch(dir.path(), r#"[{"aweme_id": "111", "title": "other"}]"#);

    let err = activity(dir.path(), CountingSigner::new())
        .get_video_metadata("777", &credential())
        .await
        .unwrap_err();

    match err {
        ActivityError::Application(app) => {
            assert_eq!(app.error_type, ErrorType::IdNotFound);
            assert!(!app.non_retryable);
        }
        other => panic!("expected Application error, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_batch_file_maps_to_retryable_id_not_found() {
    let dir = tempfile::tempdir().unwrap();

    let err = activity(dir.path(), CountingSigner::new())
        .get_video_metadata("777", &credential())
        .await
        .unwrap_err();

    match err {
        ActivityError::Application(app) => {
            assert_eq!(app.error_type, ErrorType::IdNotFound);
            assert!(!app.non_retryable);
        }
        other => panic!("expected Application error, got {:?}", other),
    }
}

#[tokio::test]
async fn duplicate_ids_resolve_last_wins() {
    let dir = tempfile::tempdir().unwrap();
    seed_batch(
        dir.path(),
        r#"[{"aweme_id": "1", "title": "A"}, {"aweme_id": "1", "title": "B"}]"#,
    );

    let metadata = activity(dir.path(), CountingSigner::new())
        .get_video_metadata("1", &credential())
        .await
        .unwrap();

    assert_eq!(metadata.title, "B");
}

#[tokio::test]
async fn missing_credential_file_aborts_outside_the_taxonomy() {
    // * The real browserless constructor loads the credential file; with no
    // * file present the run aborts before any network or signing activity.
    let dir = tempfile::tempdir().unwrap();
    let signer = CountingSigner::new();
    let activity = MetadataActivity::new(
        CrawlerFactory::with_builtin(),
        signer.clone(),
        dir.path().join("douyin_cookies_config.json"),
        dir.path().to_path_buf(),
    );

    let err = activity
        .get_video_metadata("777", &credential())
        .await
        .unwrap_err();

    assert!(matches!(err, ActivityError::Aborted(_)));
    assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
}
