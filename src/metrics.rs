// Prometheus metrics definitions for the status poller.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// 1 if the last rendered status was online, 0 otherwise.
    pub static ref BOT_ONLINE: IntGauge =
        IntGauge::new("duel_lords_status_bot_online", "Last rendered bot status (1 = online)").unwrap();

    /// Poll cycles currently waiting on the backend.
    pub static ref POLLS_IN_FLIGHT: IntGauge =
        IntGauge::new("duel_lords_status_polls_in_flight", "Status polls awaiting a response").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Completed polls, by outcome (online, offline, request_error, http_error, body_error).
    pub static ref POLLS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("duel_lords_status_polls_total", "Completed status polls"),
        &["outcome"],
    )
    .unwrap();

    /// Poll results dropped because a later-started poll had already rendered.
    pub static ref STALE_RESULTS_TOTAL: IntCounter = IntCounter::new(
        "duel_lords_status_stale_results_total",
        "Poll results superseded by a newer poll",
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Wall time of a single status request, including body decoding.
    pub static ref POLL_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "duel_lords_status_poll_duration_seconds",
            "Status poll duration in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 30.0]),
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(BOT_ONLINE.clone()),
        Box::new(POLLS_IN_FLIGHT.clone()),
        Box::new(POLLS_TOTAL.clone()),
        Box::new(STALE_RESULTS_TOTAL.clone()),
        Box::new(POLL_DURATION_SECONDS.clone()),
    ];

    for c in collectors {
        if let Err(e) = REGISTRY.register(c) {
            tracing::warn!("Failed to register metric: {e}");
        }
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
