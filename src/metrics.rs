//! Prometheus metrics for fishd.
//!
//! - `fishd_command_total{command}` - commands run, by name
//! - `fishd_command_duration_seconds{command}` - command latency histogram
//! - `fishd_command_errors_total{command,error}` - failed commands by error code
//! - `fishd_moderation_actions_total{kind}` - moderation transitions applied
//! - `fishd_rate_limited_total` - invocations dropped by the rate limiter
//! - `fishd_online_players` - players currently online

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();
pub static MODERATION_ACTIONS: OnceLock<IntCounterVec> = OnceLock::new();
pub static RATE_LIMITED: OnceLock<IntCounter> = OnceLock::new();
pub static ONLINE_PLAYERS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the metrics registry.
///
/// Recording before `init` is a silent no-op.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("fishd_command_total", "Commands run by name"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("fishd_command_duration_seconds", "Command latency by name")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("fishd_command_errors_total", "Command errors by name and code"), &["command", "error"]));
    register!(MODERATION_ACTIONS, IntCounterVec::new(Opts::new("fishd_moderation_actions_total", "Moderation transitions applied"), &["kind"]));
    register!(RATE_LIMITED, IntCounter::new("fishd_rate_limited_total", "Invocations dropped by the rate limiter"));
    register!(ONLINE_PLAYERS, IntGauge::new("fishd_online_players", "Players currently online"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

#[inline]
pub fn record_moderation(kind: &str) {
    if let Some(c) = MODERATION_ACTIONS.get() {
        c.with_label_values(&[kind]).inc();
    }
}

#[inline]
pub fn record_rate_limited() {
    if let Some(c) = RATE_LIMITED.get() {
        c.inc();
    }
}

#[inline]
pub fn set_online_players(count: i64) {
    if let Some(g) = ONLINE_PLAYERS.get() {
        g.set(count);
    }
}
