//! Pipeline tests against real sinks: UDP replication, a refused database
//! connection and callback scripts.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use awsx_protocol::Observation;
use awsxd::config::ReplicationTarget;
use awsxd::sinks::{DatabaseSink, ProgramNotifier, UdpReplicator};
use awsxd::{
    NotificationSink, ObservationPipeline, PersistenceSink, PipelineConfig, SinkError, SinkKind,
    SinkOutcome,
};
use storage::{DatabaseSettings, ObservationStore};
use test_utils::{
    recv_text, udp_collector, unused_local_addr, BAD_CHECKSUM_SENTENCE, SAMPLE_SENTENCE,
    SAMPLE_STATION,
};

const WAIT: Duration = Duration::from_secs(2);

/// Remembers the station of every observation it is handed.
#[derive(Default)]
struct RecordingSink {
    stations: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn stations(&self) -> Vec<String> {
        self.stations.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersistenceSink for RecordingSink {
    async fn persist(&self, observation: &Observation) -> Result<(), SinkError> {
        self.stations
            .lock()
            .unwrap()
            .push(observation.station_id().to_string());
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, station_id: &str) -> Result<(), SinkError> {
        self.stations.lock().unwrap().push(station_id.to_string());
        Ok(())
    }
}

/// Never finishes within any reasonable timeout.
struct StalledSink;

#[async_trait]
impl PersistenceSink for StalledSink {
    async fn persist(&self, _observation: &Observation) -> Result<(), SinkError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

fn replicator_to(addr: std::net::SocketAddr) -> Arc<UdpReplicator> {
    Arc::new(UdpReplicator::new(ReplicationTarget {
        host: addr.ip().to_string(),
        port: addr.port(),
    }))
}

fn refused_store() -> ObservationStore {
    let addr = unused_local_addr();
    ObservationStore::connect_lazy(&DatabaseSettings {
        host: addr.ip().to_string(),
        port: addr.port(),
        connection_timeout_secs: 1,
        ..DatabaseSettings::default()
    })
}

// ============================================================================
// Replication
// ============================================================================

#[tokio::test]
async fn test_replicates_reencoded_sentence_without_noise() {
    let (collector, addr) = udp_collector().await;
    let persistence = Arc::new(RecordingSink::default());
    let pipeline = ObservationPipeline::new(PipelineConfig::default(), persistence.clone())
        .with_replication(replicator_to(addr));

    let noisy = format!("\r\n~~{}  junk", SAMPLE_SENTENCE);
    let result = pipeline.process(&noisy, None).await;

    let report = result.report().unwrap();
    assert!(report.all_succeeded());
    assert_eq!(persistence.stations(), vec![SAMPLE_STATION.to_string()]);
    assert_eq!(
        recv_text(&collector, WAIT).await.as_deref(),
        Some(SAMPLE_SENTENCE)
    );
}

#[tokio::test]
async fn test_rejected_frame_is_not_replicated() {
    let (collector, addr) = udp_collector().await;
    let persistence = Arc::new(RecordingSink::default());
    let pipeline = ObservationPipeline::new(PipelineConfig::default(), persistence.clone())
        .with_replication(replicator_to(addr));

    let result = pipeline.process(BAD_CHECKSUM_SENTENCE, None).await;

    assert!(result.is_rejected());
    assert!(persistence.stations().is_empty());
    assert_eq!(recv_text(&collector, Duration::from_millis(200)).await, None);
}

// ============================================================================
// Failure isolation
// ============================================================================

#[tokio::test]
async fn test_refused_database_still_replicates_and_notifies() {
    let (collector, addr) = udp_collector().await;
    let notified = Arc::new(RecordingSink::default());
    let pipeline = ObservationPipeline::new(
        PipelineConfig::default(),
        Arc::new(DatabaseSink::new(refused_store())),
    )
    .with_replication(replicator_to(addr))
    .with_notification(notified.clone());

    let result = pipeline.process(SAMPLE_SENTENCE, None).await;
    let report = result.report().unwrap();

    assert!(report.persistence.is_failure());
    assert_eq!(report.replication, SinkOutcome::Succeeded);
    assert_eq!(report.notification, SinkOutcome::Succeeded);
    assert_eq!(
        recv_text(&collector, WAIT).await.as_deref(),
        Some(SAMPLE_SENTENCE)
    );
    assert_eq!(notified.stations(), vec![SAMPLE_STATION.to_string()]);
}

#[tokio::test]
async fn test_stalled_sink_times_out_and_next_sink_runs() {
    let notified = Arc::new(RecordingSink::default());
    let pipeline = ObservationPipeline::new(
        PipelineConfig {
            verbosity: 0,
            sink_timeout: Duration::from_millis(100),
        },
        Arc::new(StalledSink),
    )
    .with_notification(notified.clone());

    let result = pipeline.process(SAMPLE_SENTENCE, None).await;
    let report = result.report().unwrap();

    assert_eq!(
        report.persistence,
        SinkOutcome::Failed("persistence sink timed out after 100ms".to_string())
    );
    assert_eq!(report.failed_sinks(), vec![SinkKind::Persistence]);
    assert_eq!(notified.stations(), vec![SAMPLE_STATION.to_string()]);
}

#[tokio::test]
async fn test_unresolvable_replication_target_is_contained() {
    let persistence = Arc::new(RecordingSink::default());
    let pipeline = ObservationPipeline::new(PipelineConfig::default(), persistence.clone())
        .with_replication(Arc::new(UdpReplicator::new(ReplicationTarget {
            host: "relay.invalid".to_string(),
            port: 9999,
        })));

    let result = pipeline.process(SAMPLE_SENTENCE, None).await;
    let report = result.report().unwrap();

    assert_eq!(report.persistence, SinkOutcome::Succeeded);
    assert!(report.replication.is_failure());
    assert_eq!(pipeline.metrics().snapshot().replication_failures, 1);
}

// ============================================================================
// Notification programs
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_callback_receives_station_id() {
    let dir = test_utils::scratch_dir();
    let out = dir.path().join("args.txt");
    let script = test_utils::write_script(
        dir.path(),
        "cb.sh",
        &format!("echo \"$#:$1\" > {}", out.display()),
    );

    let pipeline = ObservationPipeline::new(
        PipelineConfig::default(),
        Arc::new(RecordingSink::default()),
    )
    .with_notification(Arc::new(ProgramNotifier::new(script)));

    let result = pipeline.process(SAMPLE_SENTENCE, None).await;
    assert_eq!(result.report().unwrap().notification, SinkOutcome::Succeeded);

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written.trim(), format!("1:{}", SAMPLE_STATION));
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_callback_is_reported() {
    let dir = test_utils::scratch_dir();
    let script = test_utils::write_script(dir.path(), "fail.sh", "exit 4");

    let pipeline = ObservationPipeline::new(
        PipelineConfig::default(),
        Arc::new(RecordingSink::default()),
    )
    .with_notification(Arc::new(ProgramNotifier::new(&script)));

    let result = pipeline.process(SAMPLE_SENTENCE, None).await;
    let report = result.report().unwrap();

    assert_eq!(report.persistence, SinkOutcome::Succeeded);
    assert_eq!(
        report.notification,
        SinkOutcome::Failed(format!(
            "Callback '{}' failed with retcode 4",
            script.display()
        ))
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_hanging_callback_is_timed_out() {
    let dir = test_utils::scratch_dir();
    let script = test_utils::write_script(dir.path(), "hang.sh", "sleep 30");

    let pipeline = ObservationPipeline::new(
        PipelineConfig {
            verbosity: 0,
            sink_timeout: Duration::from_millis(200),
        },
        Arc::new(RecordingSink::default()),
    )
    .with_notification(Arc::new(ProgramNotifier::new(script)));

    let started = std::time::Instant::now();
    let result = pipeline.process(SAMPLE_SENTENCE, None).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(result.report().unwrap().notification.is_failure());
}
