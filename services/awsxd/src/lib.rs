//! AWS-X weather station daemon.
//!
//! Receives checksummed `$DPTAW` sentences over UDP, decodes them and hands
//! each observation to the persistence, replication and notification sinks.

pub mod config;
pub mod config_loader;
pub mod metrics;
pub mod pipeline;
pub mod server;
pub mod sinks;

pub use config::{AwsxdConfig, CliOptions, ReplicationTarget};
pub use config_loader::{load_file_config, FileConfig, LogFormat};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use pipeline::{DispatchReport, ObservationPipeline, PipelineConfig, PipelineResult, SinkOutcome};
pub use server::UdpListener;
pub use sinks::{
    NotificationSink, PersistenceSink, ReplicationSink, SinkError, SinkKind,
};
