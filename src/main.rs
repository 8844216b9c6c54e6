use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use aweme_flow::activity::{CookieCredential, MetadataActivity};
use aweme_flow::config::run::CrawlConfig;
use aweme_flow::crawler::factory::CrawlerFactory;
use aweme_flow::network::signer::NodeSigner;
use aweme_flow::ops::telemetry;

fn signer_script() -> PathBuf {
    std::env::var("AWEME_SIGNER_SCRIPT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("libs/a_bogus.js"))
}

async fn run_crawl(factory: &CrawlerFactory, config_path: &Path) -> Result<(), String> {
    let config = CrawlConfig::load(config_path).map_err(|e| e.to_string())?;
    let signer = Arc::new(NodeSigner::new(signer_script()));
    let mut crawler = factory.create(&config, signer).map_err(|e| e.to_string())?;
    let run = crawler.start().await;
    crawler.close().await;
    run.map_err(|e| e.to_string())
}

async fn run_fetch(
    factory: CrawlerFactory,
    video_id: &str,
    credential_path: &Path,
) -> Result<(), String> {
    let raw = std::fs::read_to_string(credential_path).map_err(|e| e.to_string())?;
    let credential: CookieCredential = serde_json::from_str(&raw).map_err(|e| e.to_string())?;

    let signer = Arc::new(NodeSigner::new(signer_script()));
    let activity = MetadataActivity::new(
        factory,
        signer,
        PathBuf::from("douyin_cookies_config.json"),
        PathBuf::from("data"),
    );

    let metadata = activity
        .get_video_metadata(video_id, &credential)
        .await
        .map_err(|e| e.to_string())?;
    println!("{}", serde_json::to_string_pretty(&metadata).map_err(|e| e.to_string())?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();

    let _metrics = match std::env::var("AWEME_METRICS_PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
    {
        Some(port) => Some(telemetry::start_metrics_server(port).await),
        None => None,
    };

    let factory = CrawlerFactory::with_builtin();
    if let Err(err) = factory.validate() {
        tracing::error!(error = %err, "crawler registry failed validation");
        return ExitCode::FAILURE;
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = match args.first().map(String::as_str) {
        Some("run") => {
            let path = args.get(1).map(String::as_str).unwrap_or("run_config.json");
            run_crawl(&factory, Path::new(path)).await
        }
        Some("fetch") => match (args.get(1), args.get(2)) {
            (Some(video_id), Some(credential)) => {
                run_fetch(factory, video_id, Path::new(credential)).await
            }
            _ => Err("usage: aweme-flow fetch <video_id> <credential.json>".to_string()),
        },
        _ => Err("usage: aweme-flow run [config.json] | fetch <video_id> <credential.json>".to_string()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "worker command failed");
            ExitCode::FAILURE
        }
    }
}
