// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the DKIM manager.
//!
//! All metrics carry the namespace prefix `dkim_manager_atelierhsn_com_`
//! (prometheus-safe version of "dkim-manager.atelierhsn.com").
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Reconciliation outcomes and duration
//! - **Key Metrics** - Key pairs generated, by key type
//! - **Webhook Metrics** - Admission decisions and schema conversions
//!
//! # Example
//!
//! ```rust,no_run
//! use dkim_manager::metrics::record_reconciliation;
//!
//! record_reconciliation("ready", std::time::Duration::from_millis(250));
//! ```

use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "dkim_manager_atelierhsn_com";

/// Global Prometheus metrics registry, exposed via the `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by outcome
///
/// Labels:
/// - `outcome`: `ready`, `up_to_date`, `invalid`, `failed`, `finalized`, ...
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of DKIMKey reconciliations by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of DKIMKey reconciliations in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Key Metrics
// ============================================================================

/// Total number of key pairs generated
///
/// Labels:
/// - `key_type`: `rsa` or `ed25519`
pub static KEYS_GENERATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_keys_generated_total"),
        "Total number of DKIM key pairs generated by key type",
    );
    let counter = CounterVec::new(opts, &["key_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Webhook Metrics
// ============================================================================

/// Total number of admission decisions
///
/// Labels:
/// - `webhook`: `dkimkey`, `secret`, `dnsendpoint`
/// - `verdict`: `allowed`, `denied`
pub static ADMISSION_DECISIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_admission_decisions_total"),
        "Total number of admission decisions by webhook and verdict",
    );
    let counter = CounterVec::new(opts, &["webhook", "verdict"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of converted objects
///
/// Labels:
/// - `desired_version`: target `apiVersion`
/// - `result`: `success`, `failure`
pub static CONVERSIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_conversions_total"),
        "Total number of DKIMKey conversions by desired version and result",
    );
    let counter = CounterVec::new(opts, &["desired_version", "result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Record a finished reconciliation
///
/// # Arguments
/// * `outcome` - Outcome label of the reconciliation
/// * `duration` - Duration of the reconciliation
pub fn record_reconciliation(outcome: &str, duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&[outcome]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a generated key pair
pub fn record_key_generated(key_type: &str) {
    KEYS_GENERATED_TOTAL.with_label_values(&[key_type]).inc();
}

/// Record an admission decision
pub fn record_admission(webhook: &str, verdict: &str) {
    ADMISSION_DECISIONS_TOTAL
        .with_label_values(&[webhook, verdict])
        .inc();
}

/// Record a converted object
pub fn record_conversion(desired_version: &str, result: &str) {
    CONVERSIONS_TOTAL
        .with_label_values(&[desired_version, result])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
