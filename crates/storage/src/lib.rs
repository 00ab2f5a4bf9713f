//! Persistence for decoded AWS-X observations.
//!
//! Observations are written to PostgreSQL, one row per accepted sentence,
//! using bound parameters only.

pub mod error;
pub mod observations;

pub use error::{StorageError, StorageResult};
pub use observations::{
    column_values, DatabaseSettings, ObservationStore, INSERT_OBSERVATION_SQL, OBSERVATION_TABLE,
};
