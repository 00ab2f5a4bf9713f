//! Error types for sentence decoding.

use thiserror::Error;

/// Result type alias using DecodeError.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// The raw line could not be framed or failed checksum verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("missing start delimiter")]
    MissingStartDelimiter,

    #[error("missing end delimiter")]
    MissingEndDelimiter,

    #[error("malformed checksum")]
    MalformedChecksum,

    /// `expected` is the value transmitted after `*`, `actual` the one computed.
    #[error("checksum mismatch: expected 0x{expected:02X} got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },
}

/// A checksum-valid payload did not match the field schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("field count mismatch: expected {expected} got {actual}")]
    FieldCount { expected: usize, actual: usize },

    #[error("unexpected header: got {0}")]
    UnexpectedHeader(String),

    #[error("field {name} invalid: {raw}")]
    InvalidField { name: &'static str, raw: String },
}

/// Any reason a single sentence was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{0}")]
    Frame(#[from] FrameError),

    #[error("{0}")]
    Schema(#[from] SchemaError),
}

impl DecodeError {
    /// Short label for metrics and log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            DecodeError::Frame(_) => "frame",
            DecodeError::Schema(_) => "schema",
        }
    }

    /// Checksum failures are reported regardless of verbosity.
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, DecodeError::Frame(FrameError::ChecksumMismatch { .. }))
    }
}
