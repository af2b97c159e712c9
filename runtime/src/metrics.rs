//! Prometheus metrics for request dispatch.
//!
//! The dispatcher records through the `metrics` facade; nothing is exported
//! unless a host installs a recorder. [`MetricsExporter`] installs the
//! Prometheus one and renders the scrape payload, leaving the HTTP endpoint to
//! the host.
//!
//! # Example
//!
//! ```rust,no_run
//! use method_controller_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = MetricsExporter::install()?;
//! // ... serve requests ...
//! if let Some(payload) = exporter.render() {
//!     println!("{payload}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use method_controller_core::HttpMethod;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
#[derive(Clone)]
pub struct MetricsExporter {
    handle: Option<PrometheusHandle>,
}

impl fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsExporter")
            .field("installed", &self.handle.is_some())
            .finish()
    }
}

impl MetricsExporter {
    /// Describe the dispatch metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// A recorder can only be installed once per process. A second call logs a
    /// warning and returns an exporter without a handle, so [`render`](Self::render)
    /// yields `None` on it.
    pub fn install() -> Result<Self, MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                tracing::info!("Prometheus recorder installed");
                Ok(Self {
                    handle: Some(handle),
                })
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(Self { handle: None })
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this exporter did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(
        "controller_requests_total",
        "Total number of requests dispatched, by method and response status"
    );
    describe_histogram!(
        "controller_dispatch_duration_seconds",
        "Time taken to dispatch a request end to end"
    );
    describe_counter!(
        "controller_rejections_total",
        "Total number of requests turned away before or by the handler, by reason"
    );
}

/// Dispatch metrics recorder.
pub struct DispatchMetrics;

impl DispatchMetrics {
    /// Record a dispatched request and the status it was answered with.
    ///
    /// `method` is the verb as received; anything outside the supported set
    /// is counted under `UNKNOWN`.
    pub fn record_outcome(method: &str, status: u16, duration: Duration) {
        counter!(
            "controller_requests_total",
            "method" => method_label(method),
            "status" => status.to_string()
        )
        .increment(1);
        histogram!("controller_dispatch_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a rejection by its kind label.
    pub fn record_rejection(kind: &'static str) {
        counter!("controller_rejections_total", "kind" => kind).increment(1);
    }
}

fn method_label(method: &str) -> &'static str {
    method
        .parse::<HttpMethod>()
        .map_or("UNKNOWN", HttpMethod::as_str)
}
