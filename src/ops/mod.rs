// * Operations
// * Production observability: structured logging and Prometheus metrics

pub mod telemetry;

pub use telemetry::{
    get_metrics_string, init_tracing, init_tracing_pretty, record_crawl_run, record_request,
    record_signature_computed, record_stored, request_timer, start_metrics_server,
    start_metrics_server_default, MetricsServerHandle,
};
