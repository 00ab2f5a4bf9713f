//! Builders for synthetic sentences.
//!
//! Generators work on field positions rather than names so this crate
//! stays independent of the protocol crate it helps test.

/// Mutable copy of a payload, split into fields.
#[derive(Debug, Clone)]
pub struct SentenceBuilder {
    fields: Vec<String>,
}

impl SentenceBuilder {
    /// Start from the documented sample.
    pub fn sample() -> Self {
        Self::from_payload(crate::fixtures::SAMPLE_PAYLOAD)
    }

    pub fn from_payload(payload: &str) -> Self {
        Self {
            fields: payload.split(',').map(str::to_string).collect(),
        }
    }

    /// Replace the field at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn with_field(mut self, index: usize, value: &str) -> Self {
        self.fields[index] = value.to_string();
        self
    }

    /// Append an extra field.
    pub fn push_field(mut self, value: &str) -> Self {
        self.fields.push(value.to_string());
        self
    }

    /// Drop the last field.
    pub fn pop_field(mut self) -> Self {
        self.fields.pop();
        self
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn payload(&self) -> String {
        self.fields.join(",")
    }

    /// Full sentence with a correct checksum.
    pub fn sentence(&self) -> String {
        let payload = self.payload();
        format!("${}*{:02X}", payload, xor_checksum(&payload))
    }
}

/// XOR of all bytes, computed independently of the code under test.
pub fn xor_checksum(payload: &str) -> u8 {
    let mut acc = 0u8;
    for b in payload.bytes() {
        acc ^= b;
    }
    acc
}

/// Flip one bit of the byte at `index` in `sentence`.
///
/// Returns `None` when the result would not be ASCII or would introduce a
/// new `*`, which changes framing rather than content.
pub fn flip_bit(sentence: &str, index: usize, bit: u8) -> Option<String> {
    let mut bytes = sentence.as_bytes().to_vec();
    let flipped = bytes[index] ^ (1 << bit);
    if !flipped.is_ascii() || flipped == b'*' {
        return None;
    }
    bytes[index] = flipped;
    String::from_utf8(bytes).ok()
}
