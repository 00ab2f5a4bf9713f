//! Persistence sink backed by the observation store.

use async_trait::async_trait;
use tracing::debug;

use awsx_protocol::Observation;
use storage::ObservationStore;

use super::{PersistenceSink, SinkError};

/// Writes each observation as one `awsx` row.
pub struct DatabaseSink {
    store: ObservationStore,
}

impl DatabaseSink {
    pub fn new(store: ObservationStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PersistenceSink for DatabaseSink {
    async fn persist(&self, observation: &Observation) -> Result<(), SinkError> {
        self.store.insert(observation).await?;
        debug!(
            station = %observation.station_id(),
            tstamp = %observation.timestamp(),
            "Stored observation"
        );
        Ok(())
    }
}
