//! Sentence framing and 8-bit XOR checksum.
//!
//! A sentence is `$<payload>*<XX>` where `XX` is the XOR of every payload
//! byte rendered as two hex digits. Anything before the first `$` or after
//! the checksum digits is ignored.
//!
//! On the wire a sentence is raw 8-bit text. [`from_wire`] maps each byte to
//! the ISO-8859-1 character of the same value and [`to_wire`] reverses it, so
//! a station name outside ASCII checksums exactly as transmitted.

use crate::error::FrameError;

/// Start-of-sentence delimiter.
pub const START_DELIMITER: char = '$';

/// End-of-payload delimiter; the checksum digits follow it.
pub const END_DELIMITER: char = '*';

/// Payload text that passed checksum verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedPayload<'a> {
    payload: &'a str,
    checksum: u8,
}

impl<'a> ValidatedPayload<'a> {
    /// The bytes strictly between `$` and `*`.
    pub fn as_str(&self) -> &'a str {
        self.payload
    }

    /// The transmitted (and verified) checksum.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }
}

/// XOR-fold every wire byte of `payload`, starting from 0.
pub fn checksum(payload: &str) -> u8 {
    payload.chars().fold(0, |acc, c| acc ^ wire_byte(c))
}

/// Decode datagram bytes, one character per byte.
pub fn from_wire(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode text for transmission; characters above U+00FF become `?`.
pub fn to_wire(text: &str) -> Vec<u8> {
    text.chars().map(wire_byte).collect()
}

fn wire_byte(c: char) -> u8 {
    u8::try_from(c).unwrap_or(b'?')
}

/// Locate the payload in a raw line and verify its checksum.
pub fn validate(raw: &str) -> Result<ValidatedPayload<'_>, FrameError> {
    let start = raw
        .find(START_DELIMITER)
        .ok_or(FrameError::MissingStartDelimiter)?;
    let payload_start = start + START_DELIMITER.len_utf8();

    let end = raw[payload_start..]
        .find(END_DELIMITER)
        .map(|offset| payload_start + offset)
        .ok_or(FrameError::MissingEndDelimiter)?;

    let digits_start = end + END_DELIMITER.len_utf8();
    let expected = raw
        .get(digits_start..digits_start + 2)
        .and_then(parse_hex_byte)
        .ok_or(FrameError::MalformedChecksum)?;

    let payload = &raw[payload_start..end];
    let actual = checksum(payload);
    if actual != expected {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    Ok(ValidatedPayload {
        payload,
        checksum: expected,
    })
}

/// Wrap a payload as `$<payload>*<XX>` with a freshly computed checksum.
pub fn encode(payload: &str) -> String {
    format!(
        "{}{}{}{:02X}",
        START_DELIMITER,
        payload,
        END_DELIMITER,
        checksum(payload)
    )
}

fn parse_hex_byte(digits: &str) -> Option<u8> {
    if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}
