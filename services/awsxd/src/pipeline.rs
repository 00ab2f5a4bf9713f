//! Observation pipeline: frame check, decode, then fan-out to sinks.
//!
//! Sinks run in a fixed order (persistence, replication, notification) and
//! are isolated from each other: an error, timeout or panic in one is
//! recorded in the [`DispatchReport`] and the next sink still runs. Nothing
//! here returns an error to the caller.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use awsx_protocol::{parse_sentence, DecodeError, Observation};
use storage::{column_values, ObservationStore, INSERT_OBSERVATION_SQL};

use crate::config::AwsxdConfig;
use crate::metrics::MetricsCollector;
use crate::sinks::{
    DatabaseSink, NotificationSink, PersistenceSink, ProgramNotifier, ReplicationSink, SinkError,
    SinkKind, UdpReplicator,
};

/// Pipeline knobs fixed at startup.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 0 = silent, 1 = summary, 2 = full dump.
    pub verbosity: u8,
    /// Upper bound on each individual sink call.
    pub sink_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            sink_timeout: Duration::from_secs(10),
        }
    }
}

/// What happened to one sink for one observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum SinkOutcome {
    /// The sink is not configured.
    Skipped,
    Succeeded,
    Failed(String),
}

impl SinkOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SinkOutcome::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SinkOutcome::Failed(_))
    }
}

/// Per-sink outcomes for one decoded observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub station_id: String,
    pub persistence: SinkOutcome,
    pub replication: SinkOutcome,
    pub notification: SinkOutcome,
}

impl DispatchReport {
    /// True when no configured sink failed.
    pub fn all_succeeded(&self) -> bool {
        self.failed_sinks().is_empty()
    }

    pub fn failed_sinks(&self) -> Vec<SinkKind> {
        [
            (SinkKind::Persistence, &self.persistence),
            (SinkKind::Replication, &self.replication),
            (SinkKind::Notification, &self.notification),
        ]
        .into_iter()
        .filter(|(_, outcome)| outcome.is_failure())
        .map(|(kind, _)| kind)
        .collect()
    }

    pub fn outcome(&self, sink: SinkKind) -> &SinkOutcome {
        match sink {
            SinkKind::Persistence => &self.persistence,
            SinkKind::Replication => &self.replication,
            SinkKind::Notification => &self.notification,
        }
    }
}

/// Result of pushing one raw frame through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResult {
    /// Dropped during framing or decoding; no sink ran.
    Rejected(DecodeError),
    Dispatched(DispatchReport),
}

impl PipelineResult {
    pub fn is_rejected(&self) -> bool {
        matches!(self, PipelineResult::Rejected(_))
    }

    pub fn rejection(&self) -> Option<&DecodeError> {
        match self {
            PipelineResult::Rejected(err) => Some(err),
            PipelineResult::Dispatched(_) => None,
        }
    }

    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            PipelineResult::Dispatched(report) => Some(report),
            PipelineResult::Rejected(_) => None,
        }
    }
}

/// Drives raw frames through decode and all configured sinks.
pub struct ObservationPipeline {
    config: PipelineConfig,
    persistence: Arc<dyn PersistenceSink>,
    replication: Option<Arc<dyn ReplicationSink>>,
    notification: Option<Arc<dyn NotificationSink>>,
    metrics: Arc<MetricsCollector>,
}

impl ObservationPipeline {
    pub fn new(config: PipelineConfig, persistence: Arc<dyn PersistenceSink>) -> Self {
        Self {
            config,
            persistence,
            replication: None,
            notification: None,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    pub fn with_replication(mut self, sink: Arc<dyn ReplicationSink>) -> Self {
        self.replication = Some(sink);
        self
    }

    pub fn with_notification(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notification = Some(sink);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Build the production pipeline: database store, plus UDP replication
    /// and program notification when configured.
    pub fn from_config(config: &AwsxdConfig) -> Self {
        let store = ObservationStore::connect_lazy(&config.database);
        let mut pipeline =
            Self::new(config.pipeline_config(), Arc::new(DatabaseSink::new(store)));

        if let Some(target) = &config.replication {
            pipeline = pipeline.with_replication(Arc::new(UdpReplicator::new(target.clone())));
        }
        if let Some(program) = &config.callback {
            pipeline = pipeline.with_notification(Arc::new(ProgramNotifier::new(program)));
        }

        pipeline
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Process one raw frame to completion.
    #[instrument(skip_all, fields(origin = ?origin))]
    pub async fn process(&self, raw: &str, origin: Option<SocketAddr>) -> PipelineResult {
        let started = Instant::now();
        self.metrics.record_frame_received();

        let observation = match parse_sentence(raw) {
            Ok(observation) => observation,
            Err(err) => {
                self.log_rejection(raw, &err);
                self.metrics.record_rejection(&err);
                self.metrics.record_pipeline_duration(started.elapsed());
                return PipelineResult::Rejected(err);
            }
        };

        self.metrics.record_observation();
        self.log_observation(raw, &observation);

        let report = self.dispatch(Arc::new(observation)).await;
        self.metrics.record_pipeline_duration(started.elapsed());

        PipelineResult::Dispatched(report)
    }

    async fn dispatch(&self, observation: Arc<Observation>) -> DispatchReport {
        let persistence = {
            let sink = Arc::clone(&self.persistence);
            let observation = Arc::clone(&observation);
            self.run_sink(SinkKind::Persistence, async move {
                sink.persist(&observation).await
            })
            .await
        };

        let replication = match &self.replication {
            Some(sink) => {
                let target = sink.target();
                let sink = Arc::clone(sink);
                let observation = Arc::clone(&observation);
                let outcome = self
                    .run_sink(SinkKind::Replication, async move {
                        sink.replicate(&observation).await
                    })
                    .await;
                if outcome.is_success() && self.config.verbosity > 1 {
                    debug!("Packet replicated for {}", target);
                }
                outcome
            }
            None => SinkOutcome::Skipped,
        };

        let notification = match &self.notification {
            Some(sink) => {
                let sink = Arc::clone(sink);
                let station_id = observation.station_id().to_string();
                self.run_sink(SinkKind::Notification, async move {
                    sink.notify(&station_id).await
                })
                .await
            }
            None => SinkOutcome::Skipped,
        };

        DispatchReport {
            station_id: observation.station_id().to_string(),
            persistence,
            replication,
            notification,
        }
    }

    /// Run one sink call on its own task, bounded by the sink timeout.
    ///
    /// The timeout lives inside the task so that the sink future is dropped
    /// when it fires; a notification child is killed on drop.
    async fn run_sink<F>(&self, kind: SinkKind, call: F) -> SinkOutcome
    where
        F: Future<Output = Result<(), SinkError>> + Send + 'static,
    {
        let timeout = self.config.sink_timeout;
        let task = tokio::spawn(async move {
            match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(SinkError::Timeout {
                    sink: kind,
                    timeout,
                }),
            }
        });

        let result = match task.await {
            Ok(result) => result,
            Err(_) => Err(SinkError::Panicked(kind)),
        };

        match result {
            Ok(()) => SinkOutcome::Succeeded,
            Err(err) => {
                warn!(sink = %kind, error = %err, "Sink failed");
                self.metrics.record_sink_failure(kind);
                SinkOutcome::Failed(err.to_string())
            }
        }
    }

    fn log_rejection(&self, raw: &str, err: &DecodeError) {
        if err.is_checksum_mismatch() {
            warn!(reason = err.stage(), "Checksum failed for '{}': {}", raw, err);
        } else if self.config.verbosity > 0 {
            warn!(reason = err.stage(), "Invalid packet ({}): {}", err, raw);
        }
    }

    fn log_observation(&self, raw: &str, obs: &Observation) {
        if self.config.verbosity == 0 {
            return;
        }

        info!(
            station = %obs.station_id(),
            sms = obs.sms_counter(),
            timestamp = %obs.timestamp(),
            "Observation received"
        );

        if self.config.verbosity < 2 {
            return;
        }

        debug!(
            "{}, last {} minutes (sms #{})",
            obs.station_id(), obs.sample_interval(), obs.sms_counter()
        );
        debug!("-- Date {} {}", obs.date(), obs.time());
        debug!(
            "-- Wind current {} km/h, min {} km/h, max {} km/h, daily max {} km/h",
            obs.wind_avg(), obs.wind_min(), obs.wind_gust(), obs.daily_gust()
        );
        debug!(
            "-- Wind direction {} degrees, stability {} percent",
            obs.wind_dir(),
            obs.wind_stability_percent().trunc()
        );
        debug!(
            "-- Temp current {} C, daily min {} C, daily max {} C",
            obs.temp_avg(), obs.temp_daily_min(), obs.temp_daily_max()
        );
        debug!(frame = %raw, "Raw frame");

        let bound: Vec<String> = column_values(obs)
            .into_iter()
            .enumerate()
            .map(|(i, (column, value))| format!("${}({})={}", i + 1, column, value))
            .collect();
        debug!(sql = %INSERT_OBSERVATION_SQL.trim(), params = %bound.join(", "), "Insert statement");
    }
}
