//! Observation table writes using PostgreSQL.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::debug;

use awsx_protocol::{FieldValue, Observation};

use crate::error::{StorageError, StorageResult};

/// Table receiving one row per observation.
pub const OBSERVATION_TABLE: &str = "awsx";

/// Parameterized insert; `$1` is `date time` and is cast by the database.
pub const INSERT_OBSERVATION_SQL: &str = r#"
    INSERT INTO awsx (
        tstamp, station, sms_counter, sample_interval, wind_avg,
        wind_min, wind_max, wind_daily_max, wind_dir, wind_stability,
        air_pressure, leaf_wetness, sun_radiation, temp_avg,
        temp_daily_min, temp_daily_max, soil_temp, rainfall,
        rainfall_daily, soil_moisture, dewpoint, humidity,
        humidity_daily_min, humidity_daily_max, power_supply,
        battery_voltage
    ) VALUES (
        CAST($1 AS TIMESTAMP), $2, $3, $4, $5,
        $6, $7, $8, $9, $10,
        $11, $12, $13, $14,
        $15, $16, $17, $18,
        $19, $20, $21, $22,
        $23, $24, $25,
        $26
    )
"#;

/// Database connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    /// Upper bound on waiting for a pooled connection.
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "awsxd".to_string(),
            user: "awsxd".to_string(),
            password: String::new(),
            max_connections: 4,
            connection_timeout_secs: 5,
        }
    }
}

impl DatabaseSettings {
    fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);

        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}

/// Writes observations to the `awsx` table.
pub struct ObservationStore {
    pool: PgPool,
}

impl ObservationStore {
    /// Create a store whose connections are opened on first use.
    ///
    /// An unreachable database therefore surfaces as an insert error for
    /// the observation being written, not as a startup failure.
    pub fn connect_lazy(settings: &DatabaseSettings) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(settings.connection_timeout_secs))
            .connect_lazy_with(settings.connect_options());

        debug!(
            host = %settings.host,
            port = settings.port,
            database = %settings.database,
            "Configured lazy observation store"
        );

        Self { pool }
    }

    /// Verify the database is reachable.
    pub async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    /// Insert one observation row.
    pub async fn insert(&self, observation: &Observation) -> StorageResult<()> {
        let mut query = sqlx::query(INSERT_OBSERVATION_SQL);
        for (_, value) in column_values(observation) {
            query = match value {
                FieldValue::Text(s) => query.bind(s),
                FieldValue::Integer(i) => query.bind(i),
                FieldValue::Float(f) => query.bind(f),
            };
        }

        let result = query.execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::Insert(format!(
                "no row written for station {}",
                observation.station_id()
            )));
        }

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Values bound to `$1..$26`, in column order.
pub fn column_values(obs: &Observation) -> Vec<(&'static str, FieldValue)> {
    use FieldValue::{Float, Integer, Text};

    vec![
        ("tstamp", Text(obs.timestamp())),
        ("station", Text(obs.station_id().to_string())),
        ("sms_counter", Integer(obs.sms_counter())),
        ("sample_interval", Float(obs.sample_interval())),
        ("wind_avg", Float(obs.wind_avg())),
        ("wind_min", Float(obs.wind_min())),
        ("wind_max", Float(obs.wind_gust())),
        ("wind_daily_max", Float(obs.daily_gust())),
        ("wind_dir", Integer(obs.wind_dir())),
        ("wind_stability", Integer(obs.wind_dir_stddev())),
        ("air_pressure", Float(obs.wind_stddev_or_pressure())),
        ("leaf_wetness", Integer(obs.leaf_wetness())),
        ("sun_radiation", Integer(obs.solar_radiation())),
        ("temp_avg", Float(obs.temp_avg())),
        ("temp_daily_min", Float(obs.temp_daily_min())),
        ("temp_daily_max", Float(obs.temp_daily_max())),
        ("soil_temp", Float(obs.soil_temp())),
        ("rainfall", Float(obs.rainfall())),
        ("rainfall_daily", Float(obs.daily_rainfall())),
        ("soil_moisture", Integer(obs.soil_water_potential())),
        ("dewpoint", Float(obs.dewpoint())),
        ("humidity", Float(obs.humidity())),
        ("humidity_daily_min", Float(obs.humidity_daily_min())),
        ("humidity_daily_max", Float(obs.humidity_daily_max())),
        ("power_supply", Text(obs.power_type().to_string())),
        ("battery_voltage", Float(obs.battery_voltage())),
    ]
}
