//! Daemon metrics collection and reporting.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;

use awsx_protocol::DecodeError;

use crate::sinks::SinkKind;

/// Counters for one daemon run.
///
/// Every recording also goes to the `metrics` facade, so an installed
/// Prometheus exporter sees the same numbers.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    frames_received: AtomicU64,
    frames_rejected: AtomicU64,
    observations: AtomicU64,
    persistence_failures: AtomicU64,
    replication_failures: AtomicU64,
    notification_failures: AtomicU64,
}

/// Point-in-time copy of [`MetricsCollector`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_rejected: u64,
    pub observations: u64,
    pub persistence_failures: u64,
    pub replication_failures: u64,
    pub notification_failures: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        counter!("awsxd_frames_received_total").increment(1);
    }

    /// Record a frame dropped before any sink ran.
    pub fn record_rejection(&self, error: &DecodeError) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
        counter!("awsxd_frames_rejected_total", "reason" => error.stage()).increment(1);
    }

    pub fn record_observation(&self) {
        self.observations.fetch_add(1, Ordering::Relaxed);
        counter!("awsxd_observations_total").increment(1);
    }

    pub fn record_sink_failure(&self, sink: SinkKind) {
        let slot = match sink {
            SinkKind::Persistence => &self.persistence_failures,
            SinkKind::Replication => &self.replication_failures,
            SinkKind::Notification => &self.notification_failures,
        };
        slot.fetch_add(1, Ordering::Relaxed);
        counter!("awsxd_sink_failures_total", "sink" => sink.as_str()).increment(1);
    }

    pub fn record_pipeline_duration(&self, elapsed: Duration) {
        histogram!("awsxd_pipeline_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            observations: self.observations.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            replication_failures: self.replication_failures.load(Ordering::Relaxed),
            notification_failures: self.notification_failures.load(Ordering::Relaxed),
        }
    }
}

/// Install the Prometheus recorder with its own HTTP listener on `port`.
///
/// Must be called from inside a tokio runtime.
pub fn install_exporter(port: u16) -> Result<SocketAddr> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("Failed to install Prometheus exporter on {}", addr))?;
    Ok(addr)
}
