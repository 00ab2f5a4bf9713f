//! Property-based tests over randomly generated sentences.

use proptest::prelude::*;

use awsx_protocol::{
    encode, parse_sentence, DecodeError, FieldKind, SchemaError, FIELD_SCHEMA, SENTENCE_TAG,
};
use test_utils::flip_bit;

/// Text a station could put in a field of the given kind.
fn field_text(kind: FieldKind) -> BoxedStrategy<String> {
    match kind {
        FieldKind::Text => "[A-Za-z0-9/:. _-]{0,12}".boxed(),
        FieldKind::Integer => any::<i64>().prop_map(|v| v.to_string()).boxed(),
        FieldKind::Float => (-1.0e6f64..1.0e6).prop_map(|v| v.to_string()).boxed(),
    }
}

/// A payload that decodes: correct header, one well-typed value per field.
fn valid_payload() -> impl Strategy<Value = String> {
    let fields: Vec<BoxedStrategy<String>> = FIELD_SCHEMA
        .fields()
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            if index == 0 {
                Just(SENTENCE_TAG.to_string()).boxed()
            } else {
                field_text(spec.kind)
            }
        })
        .collect();
    fields.prop_map(|fields| fields.join(","))
}

proptest! {
    // ========================================================================
    // Round trip
    // ========================================================================

    #[test]
    fn test_decoded_observation_reencodes_to_same_sentence(payload in valid_payload()) {
        let sentence = encode(&payload);
        let obs = parse_sentence(&sentence).unwrap();

        let reencoded = obs.to_sentence();
        prop_assert_eq!(&reencoded, &sentence);
        prop_assert_eq!(parse_sentence(&reencoded).unwrap(), obs);
    }

    // ========================================================================
    // Corruption
    // ========================================================================

    #[test]
    fn test_any_single_bit_flip_in_payload_is_a_checksum_mismatch(
        payload in valid_payload(),
        offset in any::<prop::sample::Index>(),
        bit in 0u8..7,
    ) {
        let sentence = encode(&payload);
        let index = 1 + offset.index(payload.len());

        let corrupted = flip_bit(&sentence, index, bit);
        prop_assume!(corrupted.is_some());

        let err = parse_sentence(&corrupted.unwrap()).unwrap_err();
        prop_assert!(err.is_checksum_mismatch(), "flip at {} bit {} gave {:?}", index, bit, err);
    }

    // ========================================================================
    // Field count
    // ========================================================================

    #[test]
    fn test_wrong_field_count_is_a_schema_error(
        mut fields in prop::collection::vec("[A-Za-z0-9.]{0,6}", 1..60),
        with_header in any::<bool>(),
    ) {
        let count = fields.len();
        prop_assume!(count != FIELD_SCHEMA.len());
        if with_header {
            fields[0] = SENTENCE_TAG.to_string();
        }

        let result = parse_sentence(&encode(&fields.join(",")));
        prop_assert_eq!(
            result,
            Err(DecodeError::Schema(SchemaError::FieldCount {
                expected: FIELD_SCHEMA.len(),
                actual: count,
            }))
        );
    }
}
