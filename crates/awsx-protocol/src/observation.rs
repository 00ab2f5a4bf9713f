//! Typed observation record and the schema it is generated from.
//!
//! The field list below is the single source of truth: it expands into
//! [`FIELD_SCHEMA`] (names, positions and kinds) and the [`Observation`]
//! struct, so the two cannot drift apart.

use serde::Serialize;

use crate::error::SchemaError;
use crate::frame;
use crate::schema::{Coerce, FieldSchema, FieldSpec, FieldValue, SENTENCE_TAG};

macro_rules! observation_schema {
    ($($(#[$meta:meta])* $field:ident: $ty:ty),+ $(,)?) => {
        const FIELDS: &[FieldSpec] = &[
            $(FieldSpec { name: stringify!($field), kind: <$ty as Coerce>::KIND },)+
        ];

        /// Position → name → type contract for `DPTAW` payloads.
        pub static FIELD_SCHEMA: FieldSchema = FieldSchema::new(SENTENCE_TAG, FIELDS);

        /// One decoded sensor reading.
        ///
        /// Only obtainable through decoding, so every instance satisfies the
        /// schema: correct field count, expected header, every value coerced.
        /// Fields are read-only; [`Observation::to_sentence`] always re-encodes
        /// exactly the values the accessors report.
        ///
        /// ```compile_fail
        /// let mut obs = awsx_protocol::parse_sentence(
        ///     "$DPTAW,2003/03/19,04:48,AWSTEST,0027,10,53,1199,47,61,83,0,244,1,1531,16.0,15.0,17.0,102.0,0.0,0.0,0,13.0,84.9,82.0,99.0,E,13.1,*56",
        /// ).unwrap();
        /// obs.station_id = "OTHER".to_string();
        /// ```
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct Observation {
            $($field: $ty,)+
            #[serde(skip)]
            payload: String,
        }

        impl Observation {
            $(
                $(#[$meta])*
                pub fn $field(&self) -> <$ty as Coerce>::View<'_> {
                    Coerce::view(&self.$field)
                }
            )+

            /// Build from split payload fields. The caller has already checked
            /// the field count against [`FIELD_SCHEMA`].
            pub(crate) fn from_fields(payload: &str, raw: &[&str]) -> Result<Self, SchemaError> {
                let mut raw = raw.iter().copied();
                Ok(Self {
                    $($field: <$ty as Coerce>::coerce(
                        stringify!($field),
                        raw.next().unwrap_or_default(),
                    )?,)+
                    payload: payload.to_string(),
                })
            }

            /// Every field as `(name, value)` in schema order.
            pub fn values(&self) -> Vec<(&'static str, FieldValue)> {
                vec![$((stringify!($field), Coerce::to_value(&self.$field)),)+]
            }
        }
    };
}

observation_schema! {
    /// Command tag, always `DPTAW`.
    header: String,
    /// `yyyy/mm/dd`, not calendar-checked.
    date: String,
    /// `hh:mm`, not calendar-checked.
    time: String,
    /// Unique name set by SMS for each station.
    station_id: String,
    /// SMS count, usable for sequencing.
    sms_counter: i64,
    /// Sample interval in minutes (1-60).
    sample_interval: f64,
    /// Average wind speed, km/h.
    wind_avg: f64,
    /// Wind deviation or atmospheric pressure (millibar) depending on firmware.
    wind_stddev_or_pressure: f64,
    wind_min: f64,
    wind_gust: f64,
    daily_gust: f64,
    /// 0 = wet to 15 = dry.
    leaf_wetness: i64,
    /// Average wind direction, degrees.
    wind_dir: i64,
    /// Wind direction variability, 0 = steady to 15 = unstable.
    wind_dir_stddev: i64,
    /// W/m².
    solar_radiation: i64,
    temp_avg: f64,
    temp_daily_min: f64,
    temp_daily_max: f64,
    soil_temp: f64,
    rainfall: f64,
    daily_rainfall: f64,
    /// 0 = wet to 200 = dry, kPa.
    soil_water_potential: i64,
    dewpoint: f64,
    humidity: f64,
    humidity_daily_min: f64,
    humidity_daily_max: f64,
    /// `E` external supply, `B` battery.
    power_type: String,
    battery_voltage: f64,
    /// Blank field between the last comma and `*`.
    trailer: String,
}

impl Observation {
    /// The validated payload this observation was decoded from.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Re-encode as `$<payload>*<XX>` with a recomputed checksum.
    ///
    /// Noise around the original frame is not carried over.
    pub fn to_sentence(&self) -> String {
        frame::encode(&self.payload)
    }

    /// `date` and `time` joined the way the database expects them.
    pub fn timestamp(&self) -> String {
        format!("{} {}", self.date, self.time)
    }

    /// Wind direction stability, 100 = steady.
    pub fn wind_stability_percent(&self) -> f64 {
        (1.0 - self.wind_dir_stddev as f64 / 15.0) * 100.0
    }

    /// Look up a field by schema name.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.values()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}
