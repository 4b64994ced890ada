//! Prometheus metrics for a lifecycle run.
//!
//! This module provides metrics for:
//! - HTTP retries
//! - Activation (requests, polls)
//! - Downloads (results, bytes, duration)
//! - Per-item outcomes
//!
//! A batch run has no scrape endpoint, so the registry is rendered to text and
//! optionally written to a file when the run ends.

use std::path::Path;

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        // Collectors are distinct statics; registration only fails on duplicates.
        let _ = registry.register(metric);
    }
    registry
});

// =============================================================================
// HTTP
// =============================================================================

/// Retries scheduled by the retrying client, by failure reason.
pub static HTTP_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scenefetch_http_retries_total",
            "Total HTTP attempts that were retried",
        ),
        &["reason"], // "rate_limited", "status", "timeout", "transport"
    )
    .unwrap()
});

// =============================================================================
// Activation
// =============================================================================

/// Activation requests by result.
pub static ACTIVATION_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scenefetch_activation_requests_total",
            "Total activation requests",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Activation polling loops by how they ended.
pub static ACTIVATION_POLLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scenefetch_activation_polls_total",
            "Total activation polling loops",
        ),
        &["result"], // "active", "timed_out", "failed"
    )
    .unwrap()
});

// =============================================================================
// Downloads
// =============================================================================

/// Downloads by result.
pub static DOWNLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scenefetch_downloads_total", "Total asset downloads"),
        &["result"], // "success", "failed", "checksum_mismatch"
    )
    .unwrap()
});

/// Bytes written to completed asset files.
pub static DOWNLOAD_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "scenefetch_download_bytes_total",
        "Total bytes downloaded",
    )
    .unwrap()
});

/// Download duration in seconds.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "scenefetch_download_duration_seconds",
            "Duration of asset downloads",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Orchestrator
// =============================================================================

/// Work items by final outcome.
pub static ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scenefetch_items_total", "Total work items processed"),
        &["outcome"], // "downloaded", "already_downloaded", "activated", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(HTTP_RETRIES.clone()),
        Box::new(ACTIVATION_REQUESTS.clone()),
        Box::new(ACTIVATION_POLLS.clone()),
        Box::new(DOWNLOADS.clone()),
        Box::new(DOWNLOAD_BYTES.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        Box::new(ITEMS.clone()),
    ]
}

/// Encode all metrics as Prometheus text format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Writes the rendered metrics to `path`, creating parent directories.
pub fn write_to(path: &Path) -> std::io::Result<()> {
    let text = render().map_err(|e| std::io::Error::other(e.to_string()))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_returns_prometheus_format() {
        ITEMS.with_label_values(&["downloaded"]).inc();

        let output = render().unwrap();
        assert!(output.contains("scenefetch_items_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Prometheus only outputs vectors that have at least one child.
        HTTP_RETRIES.with_label_values(&["timeout"]).inc();
        ACTIVATION_REQUESTS.with_label_values(&["success"]).inc();
        ACTIVATION_POLLS.with_label_values(&["active"]).inc();
        DOWNLOADS.with_label_values(&["success"]).inc();
        DOWNLOAD_BYTES.inc_by(10);
        DOWNLOAD_DURATION.with_label_values(&["success"]).observe(1.0);
        ITEMS.with_label_values(&["failed"]).inc();

        let output = render().unwrap();
        assert!(output.contains("scenefetch_http_retries_total"));
        assert!(output.contains("scenefetch_activation_requests_total"));
        assert!(output.contains("scenefetch_activation_polls_total"));
        assert!(output.contains("scenefetch_downloads_total"));
        assert!(output.contains("scenefetch_download_bytes_total"));
        assert!(output.contains("scenefetch_download_duration_seconds"));
        assert!(output.contains("scenefetch_items_total"));
    }

    #[test]
    fn test_write_to_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("metrics.prom");
        DOWNLOAD_BYTES.inc();

        write_to(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("scenefetch_download_bytes_total"));
    }
}
