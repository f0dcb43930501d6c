//! Prometheus Metrics Module
//!
//! # Metrics Collected
//! - Active WebSocket connection gauge
//! - Socket events by event name and outcome
//! - Persisted messages and created rooms

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Currently open WebSocket connections
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "websocket_connections_active",
            "Number of active WebSocket connections",
        )
        .namespace("direct_chat"),
    )
    .expect("Failed to create WS_CONNECTIONS_ACTIVE metric")
});

/// Inbound socket events by event name and outcome ("ok" / "error")
pub static SOCKET_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("socket_events_total", "Inbound socket events handled").namespace("direct_chat"),
        &["event", "outcome"],
    )
    .expect("Failed to create SOCKET_EVENTS_TOTAL metric")
});

/// Messages persisted
pub static MESSAGES_PERSISTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("messages_persisted_total", "Chat messages written to the store")
            .namespace("direct_chat"),
    )
    .expect("Failed to create MESSAGES_PERSISTED_TOTAL metric")
});

/// Rooms created
pub static ROOMS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("rooms_created_total", "Rooms created on first contact").namespace("direct_chat"),
    )
    .expect("Failed to create ROOMS_CREATED_TOTAL metric")
});

fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(WS_CONNECTIONS_ACTIVE.clone()),
        Box::new(SOCKET_EVENTS_TOTAL.clone()),
        Box::new(MESSAGES_PERSISTED_TOTAL.clone()),
        Box::new(ROOMS_CREATED_TOTAL.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            tracing::warn!(error = %e, "Failed to register metric");
        }
    }
}

/// Record the outcome of one inbound socket event.
pub fn record_socket_event(event: &str, ok: bool) {
    SOCKET_EVENTS_TOTAL
        .with_label_values(&[event, if ok { "ok" } else { "error" }])
        .inc();
}

/// Render all metrics in the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
