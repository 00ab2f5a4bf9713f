//! Payload → [`Observation`] decoding.

use crate::error::{DecodeResult, SchemaError};
use crate::frame::{self, ValidatedPayload};
use crate::observation::{Observation, FIELD_SCHEMA};

/// Field separator inside a payload.
pub const FIELD_SEPARATOR: char = ',';

/// Decode a payload that already passed checksum verification.
pub fn decode(payload: &ValidatedPayload<'_>) -> Result<Observation, SchemaError> {
    decode_payload(payload.as_str())
}

/// Split a payload on `,` and coerce every field per [`FIELD_SCHEMA`].
///
/// Fields are not trimmed and trailing empty fields are kept, since the
/// schema ends with a blank field. The first failing field aborts decoding.
pub fn decode_payload(payload: &str) -> Result<Observation, SchemaError> {
    let fields: Vec<&str> = payload.split(FIELD_SEPARATOR).collect();

    if fields.len() != FIELD_SCHEMA.len() {
        return Err(SchemaError::FieldCount {
            expected: FIELD_SCHEMA.len(),
            actual: fields.len(),
        });
    }

    if fields[0] != FIELD_SCHEMA.header() {
        return Err(SchemaError::UnexpectedHeader(fields[0].to_string()));
    }

    Observation::from_fields(payload, &fields)
}

/// Frame, verify and decode one raw sentence.
pub fn parse_sentence(raw: &str) -> DecodeResult<Observation> {
    let payload = frame::validate(raw)?;
    Ok(decode(&payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, FrameError};

    const SAMPLE: &str = "$DPTAW,2003/03/19,04:48,AWSTEST,0027,10,53,1199,47,61,83,0,244,1,1531,\
                          16.0,15.0,17.0,102.0,0.0,0.0,0,13.0,84.9,82.0,99.0,E,13.1,*56";

    #[test]
    fn test_parse_sample_sentence() {
        let obs = parse_sentence(SAMPLE).unwrap();
        assert_eq!(obs.header(), "DPTAW");
        assert_eq!(obs.station_id(), "AWSTEST");
        assert_eq!(obs.sms_counter(), 27);
        assert_eq!(obs.temp_avg(), 16.0);
        assert_eq!(obs.power_type(), "E");
        assert_eq!(obs.trailer(), "");
    }

    #[test]
    fn test_field_count_checked_before_header() {
        let err = decode_payload("GPGGA,1,2").unwrap_err();
        assert_eq!(
            err,
            SchemaError::FieldCount {
                expected: 29,
                actual: 3
            }
        );
    }

    #[test]
    fn test_checksum_checked_before_fields() {
        let err = parse_sentence("$DPTAW,1,2*00").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Frame(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_date_and_time_are_not_validated() {
        let payload = "DPTAW,2003/13/45,99:99,AWSTEST,0027,10,53,1199,47,61,83,0,244,1,1531,\
                       16.0,15.0,17.0,102.0,0.0,0.0,0,13.0,84.9,82.0,99.0,E,13.1,";
        let obs = decode_payload(payload).unwrap();
        assert_eq!(obs.date(), "2003/13/45");
        assert_eq!(obs.time(), "99:99");
    }
}
