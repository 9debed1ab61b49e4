use std::net::SocketAddr;

use crate::engine::{Engine, EngineError};

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total HTTP requests served. Labels: method, route, status.
pub const HTTP_REQUESTS_TOTAL: &str = "campus_http_requests_total";

/// Histogram: HTTP request latency in seconds. Labels: method, route, status.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "campus_http_request_duration_seconds";

/// Counter: room attachments refused. Labels: reason.
pub const ATTACH_REJECTED_TOTAL: &str = "campus_attach_rejected_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauges: live entity counts, refreshed by the compactor tick.
pub const CAMPUSES: &str = "campus_campuses";
pub const ROOMS: &str = "campus_rooms";
pub const USERS: &str = "campus_users";
pub const RESERVATIONS: &str = "campus_reservations";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "campus_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "campus_wal_flush_batch_size";

/// Counter: completed WAL compactions.
pub const WAL_COMPACTIONS_TOTAL: &str = "campus_wal_compactions_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

pub fn record_entity_counts(engine: &Engine) {
    metrics::gauge!(CAMPUSES).set(engine.store.campus_count() as f64);
    metrics::gauge!(ROOMS).set(engine.store.room_count() as f64);
    metrics::gauge!(USERS).set(engine.store.user_count() as f64);
    metrics::gauge!(RESERVATIONS).set(engine.store.reservation_count() as f64);
}

/// Count a refused attachment under its error code.
pub fn record_attach_rejection(err: &EngineError) {
    if err.is_client_error() {
        metrics::counter!(ATTACH_REJECTED_TOTAL, "reason" => err.code()).increment(1);
    }
}
