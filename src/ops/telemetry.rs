// * Telemetry - JSON Logging and Prometheus Metrics
// * Structured logging and metrics for the crawl worker

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramTimer, HistogramVec, TextEncoder,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// * Default metrics server port
const DEFAULT_METRICS_PORT: u16 = 9000;

lazy_static! {
    // * Platform API requests by endpoint and outcome
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "aweme_requests_total",
        "Total platform API requests by endpoint and outcome",
        &["endpoint", "outcome"]
    ).unwrap();

    // * Request duration by endpoint
    pub static ref REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "aweme_request_duration_seconds",
        "Platform API request duration in seconds",
        &["endpoint"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // * Signature tokens computed by the provider
    pub static ref SIGNATURES_COMPUTED_TOTAL: Counter = register_counter!(
        "aweme_signatures_computed_total",
        "Total anti-bot signature tokens computed"
    ).unwrap();

    // * Crawl runs by mode and outcome
    pub static ref CRAWL_RUNS_TOTAL: CounterVec = register_counter_vec!(
        "aweme_crawl_runs_total",
        "Total crawl runs by mode and outcome",
        &["mode", "outcome"]
    ).unwrap();

    // * Persisted objects by kind
    pub static ref RECORDS_STORED_TOTAL: CounterVec = register_counter_vec!(
        "aweme_records_stored_total",
        "Total records persisted by kind",
        &["kind"]
    ).unwrap();
}

pub fn record_request(endpoint: &str, outcome: &str) {
    REQUESTS_TOTAL.with_label_values(&[endpoint, outcome]).inc();
}

pub fn request_timer(endpoint: &str) -> HistogramTimer {
    REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .start_timer()
}

pub fn record_signature_computed() {
    SIGNATURES_COMPUTED_TOTAL.inc();
}

pub fn record_crawl_run(mode: &str, outcome: &str) {
    CRAWL_RUNS_TOTAL.with_label_values(&[mode, outcome]).inc();
}

pub fn record_stored(kind: &str) {
    RECORDS_STORED_TOTAL.with_label_values(&[kind]).inc();
}

/// Initializes the tracing subscriber with JSON formatting
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty())
        .init();
}

/// Renders the current metric families in Prometheus text format
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Metrics server handle for graceful shutdown
pub struct MetricsServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    running: Arc<AtomicBool>,
}

impl MetricsServerHandle {
    /// Signals the metrics server to shut down
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.running.store(false, Ordering::Relaxed);
    }

    /// Returns true if the server is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Starts the Prometheus metrics HTTP server on the specified port
pub async fn start_metrics_server(port: u16) -> MetricsServerHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tokio::spawn(async move {
        let make_svc = hyper::service::make_service_fn(|_conn| async {
            Ok::<_, std::convert::Infallible>(hyper::service::service_fn(handle_metrics_request))
        });

        let server = hyper::Server::bind(&addr)
            .serve(make_svc)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });

        tracing::info!(port = port, "Metrics server started");

        if let Err(e) = server.await {
            tracing::error!(error = %e, "Metrics server error");
        }

        running_clone.store(false, Ordering::Relaxed);
        tracing::info!("Metrics server stopped");
    });

    MetricsServerHandle {
        shutdown_tx: Some(shutdown_tx),
        running,
    }
}

/// Starts the metrics server on the default port (9000)
pub async fn start_metrics_server_default() -> MetricsServerHandle {
    start_metrics_server(DEFAULT_METRICS_PORT).await
}

/// Handles incoming HTTP requests to the metrics endpoint
async fn handle_metrics_request(
    req: hyper::Request<hyper::Body>,
) -> Result<hyper::Response<hyper::Body>, std::convert::Infallible> {
    match req.uri().path() {
        "/metrics" => {
            let encoder = TextEncoder::new();
            let body = get_metrics_string();

            Ok(hyper::Response::builder()
                .status(200)
                .header("Content-Type", encoder.format_type())
                .body(hyper::Body::from(body))
                .unwrap())
        }
        "/health" => Ok(hyper::Response::builder()
            .status(200)
            .body(hyper::Body::from("OK"))
            .unwrap()),
        _ => Ok(hyper::Response::builder()
            .status(404)
            .body(hyper::Body::from("Not Found"))
            .unwrap()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render_after_recording() {
        record_request("/aweme/v1/web/aweme/detail/", "ok");
        record_signature_computed();
        record_crawl_run("detail", "ok");
        record_stored("content");

        let metrics = get_metrics_string();
        assert!(metrics.contains("aweme_requests_total"));
        assert!(metrics.contains("aweme_signatures_computed_total"));
    }

    #[tokio::test]
    async fn test_metrics_server_handle_lifecycle() {
        let handle = start_metrics_server(0).await;
        assert!(handle.is_running());
        handle.shutdown();
    }
}
