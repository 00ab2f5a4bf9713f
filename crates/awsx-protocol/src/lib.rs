//! AWS-X weather station sentence protocol.
//!
//! Stations report one observation per UDP datagram as a single text line:
//!
//! ```text
//! $DPTAW,2003/03/19,04:48,AWSTEST,0027,10,53,1199,...,E,13.1,*56
//! ```
//!
//! Decoding happens in two stages:
//!
//! - [`frame`] locates the payload between `$` and `*` and verifies the
//!   8-bit XOR checksum (NMEA 0183 style).
//! - [`decoder`] splits the payload and coerces every field according to
//!   the static [`FIELD_SCHEMA`], producing an [`Observation`].
//!
//! Both stages are pure and never touch the network or a database.

pub mod decoder;
pub mod error;
pub mod frame;
pub mod observation;
pub mod schema;

pub use decoder::{decode, decode_payload, parse_sentence};
pub use error::{DecodeError, DecodeResult, FrameError, SchemaError};
pub use frame::{checksum, encode, from_wire, to_wire, validate, ValidatedPayload};
pub use observation::{Observation, FIELD_SCHEMA};
pub use schema::{FieldKind, FieldSchema, FieldSpec, FieldValue, SENTENCE_TAG};
