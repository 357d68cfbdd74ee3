use anyhow::{Context, Result};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Minting metrics
    pub mint_requests: IntCounterVec,
    pub mint_failures: IntCounterVec,
    pub mint_duration: HistogramVec,

    // Cache metrics
    pub cache_hits: IntCounterVec,
    pub stale_served: IntCounterVec,

    // Config
    pub config_parse_failures: IntCounter,
    pub config_validation_errors: IntCounter,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("scitoken".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Minting
            mint_requests: IntCounterVec::new(Opts::new("mint_requests_total", "Token mint attempts by group"), &["group"]).unwrap(),
            mint_failures: IntCounterVec::new(Opts::new("mint_failures_total", "Credential failures by reason"), &["group", "reason"]).unwrap(),
            mint_duration: HistogramVec::new(HistogramOpts::new("mint_duration_seconds", "External mint command duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]), &["group"]).unwrap(),

            // Cache
            cache_hits: IntCounterVec::new(Opts::new("cache_hits_total", "Tokens served from the on-disk cache"), &["group"]).unwrap(),
            stale_served: IntCounterVec::new(Opts::new("stale_served_total", "Still-valid tokens served after a failed renewal"), &["group"]).unwrap(),

            // Config
            config_parse_failures: IntCounter::new("config_parse_failures_total", "YAML config parse failures").unwrap(),
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during config load").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.mint_requests.clone())).unwrap();
        reg.register(Box::new(metrics.mint_failures.clone())).unwrap();
        reg.register(Box::new(metrics.mint_duration.clone())).unwrap();
        reg.register(Box::new(metrics.cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.stale_served.clone())).unwrap();
        reg.register(Box::new(metrics.config_parse_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();

        metrics
    }

    /// Render the registry in the prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Write metrics for the node-exporter textfile collector.
/// The collector may read at any time, so write aside and rename.
pub async fn export_textfile(path: &Path) -> Result<()> {
    let rendered = get_metrics().await.render()?;
    let tmp = path.with_extension("prom.tmp");
    tokio::fs::write(&tmp, rendered.as_bytes())
        .await
        .with_context(|| format!("write metrics {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("rename metrics into {}", path.display()))?;
    debug!("metrics exported to {}", path.display());
    Ok(())
}
