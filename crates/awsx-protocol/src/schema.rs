//! Field schema: how many fields a payload carries and how each is typed.

use serde::Serialize;
use std::fmt;

use crate::error::SchemaError;

/// Command tag every AWS-X observation payload starts with.
pub const SENTENCE_TAG: &str = "DPTAW";

/// Declared type of a payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Passed through unmodified (identifiers, dates, times, flags).
    Text,
    /// Base-10 signed integer.
    Integer,
    /// Decimal or scientific notation.
    Float,
}

/// A single decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Position-indexed field declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Ordered, immutable list of fields a payload must contain.
#[derive(Debug)]
pub struct FieldSchema {
    header: &'static str,
    fields: &'static [FieldSpec],
}

impl FieldSchema {
    pub const fn new(header: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self { header, fields }
    }

    /// Expected value of the first field.
    pub fn header(&self) -> &'static str {
        self.header
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Number of comma-separated fields, header and trailing blank included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a named field.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Conversion from raw field text into a typed record member.
pub trait Coerce: Sized {
    const KIND: FieldKind;

    /// Borrowed form handed out by record accessors.
    type View<'a>
    where
        Self: 'a;

    fn coerce(name: &'static str, raw: &str) -> Result<Self, SchemaError>;

    fn view(&self) -> Self::View<'_>;

    fn to_value(&self) -> FieldValue;
}

fn invalid(name: &'static str, raw: &str) -> SchemaError {
    SchemaError::InvalidField {
        name,
        raw: raw.to_string(),
    }
}

impl Coerce for String {
    const KIND: FieldKind = FieldKind::Text;
    type View<'a> = &'a str;

    fn coerce(_name: &'static str, raw: &str) -> Result<Self, SchemaError> {
        Ok(raw.to_string())
    }

    fn view(&self) -> &str {
        self
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }
}

impl Coerce for i64 {
    const KIND: FieldKind = FieldKind::Integer;
    type View<'a> = i64;

    fn coerce(name: &'static str, raw: &str) -> Result<Self, SchemaError> {
        raw.parse::<i64>().map_err(|_| invalid(name, raw))
    }

    fn view(&self) -> i64 {
        *self
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Integer(*self)
    }
}

impl Coerce for f64 {
    const KIND: FieldKind = FieldKind::Float;
    type View<'a> = f64;

    fn coerce(name: &'static str, raw: &str) -> Result<Self, SchemaError> {
        // "inf" and "NaN" parse as f64 but are not readings
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(invalid(name, raw)),
        }
    }

    fn view(&self) -> f64 {
        *self
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Float(*self)
    }
}
