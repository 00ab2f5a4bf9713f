//! Downstream consumers of decoded observations.
//!
//! Each sink is independent: the pipeline invokes them in a fixed order
//! and a failure in one never prevents the next from running.

mod database;
mod notification;
mod replication;

pub use database::DatabaseSink;
pub use notification::ProgramNotifier;
pub use replication::UdpReplicator;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use awsx_protocol::Observation;
use storage::StorageError;

/// Which sink an outcome or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Persistence,
    Replication,
    Notification,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Persistence => "persistence",
            SinkKind::Replication => "replication",
            SinkKind::Notification => "notification",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sink failed to handle one observation.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to store observation: {0}")]
    Persistence(#[from] StorageError),

    #[error("Failed to replicate to {target}: {source}")]
    Replication {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run callback '{program}': {source}")]
    NotificationSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `code` is `None` when the program was killed by a signal.
    #[error("Callback '{program}' failed with retcode {}", retcode(.code))]
    NotificationExit { program: String, code: Option<i32> },

    #[error("{sink} sink timed out after {timeout:?}")]
    Timeout { sink: SinkKind, timeout: Duration },

    #[error("{0} sink panicked")]
    Panicked(SinkKind),
}

impl SinkError {
    pub fn sink(&self) -> SinkKind {
        match self {
            SinkError::Persistence(_) => SinkKind::Persistence,
            SinkError::Replication { .. } => SinkKind::Replication,
            SinkError::NotificationSpawn { .. } | SinkError::NotificationExit { .. } => {
                SinkKind::Notification
            }
            SinkError::Timeout { sink, .. } | SinkError::Panicked(sink) => *sink,
        }
    }
}

fn retcode(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Stores one row per observation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn persist(&self, observation: &Observation) -> Result<(), SinkError>;
}

/// Forwards observations as re-encoded, checksummed sentences.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplicationSink: Send + Sync {
    /// Destination, for logging.
    fn target(&self) -> String;

    async fn replicate(&self, observation: &Observation) -> Result<(), SinkError>;
}

/// Tells an external program which station just reported.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, station_id: &str) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_error_kind() {
        let err = SinkError::Persistence(StorageError::Connection("refused".into()));
        assert_eq!(err.sink(), SinkKind::Persistence);

        let err = SinkError::NotificationExit {
            program: "/bin/false".into(),
            code: Some(1),
        };
        assert_eq!(err.sink(), SinkKind::Notification);
        assert_eq!(err.to_string(), "Callback '/bin/false' failed with retcode 1");

        let err = SinkError::Timeout {
            sink: SinkKind::Replication,
            timeout: Duration::from_secs(2),
        };
        assert_eq!(err.sink(), SinkKind::Replication);
        assert_eq!(err.to_string(), "replication sink timed out after 2s");
    }

    #[test]
    fn test_exit_without_code() {
        let err = SinkError::NotificationExit {
            program: "cb".into(),
            code: None,
        };
        assert_eq!(err.to_string(), "Callback 'cb' failed with retcode none");
    }
}
