//! External program notification.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{NotificationSink, SinkError};

/// Runs `<program> <station_id>` once per observation.
///
/// The child is killed if the pipeline gives up waiting on it.
pub struct ProgramNotifier {
    program: PathBuf,
}

impl ProgramNotifier {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

#[async_trait]
impl NotificationSink for ProgramNotifier {
    async fn notify(&self, station_id: &str) -> Result<(), SinkError> {
        let status = Command::new(&self.program)
            .arg(station_id)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| SinkError::NotificationSpawn {
                program: self.program_name(),
                source,
            })?;

        if !status.success() {
            return Err(SinkError::NotificationExit {
                program: self.program_name(),
                code: status.code(),
            });
        }

        debug!(program = %self.program_name(), station = %station_id, "Callback completed");
        Ok(())
    }
}
