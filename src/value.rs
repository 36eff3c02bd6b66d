use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::edm::{PrimitiveKind, TypeReference};

/// A typed literal value produced by the literal resolver.
///
/// Each variant corresponds to one primitive kind; `Null` is untyped until the
/// binder sees what it is compared against.
///
/// # Examples
///
/// ```
/// use odata_query::Value;
/// use odata_query::edm::PrimitiveKind;
///
/// let value = Value::Int32(42);
/// assert_eq!(value.primitive_kind(), Some(PrimitiveKind::Int32));
/// assert_eq!(Value::Null.primitive_kind(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    /// High-precision decimal (`1.50m`)
    Decimal(Decimal),
    String(String),
    Binary(Vec<u8>),
    Guid(Uuid),
    /// Calendar date and time without offset (`datetime'...'`)
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    /// Duration (`time'PT1H30M'`)
    Time(TimeDelta),
    Geography(SpatialValue),
    Geometry(SpatialValue),
}

/// Well-known-text payload of a spatial literal, with its optional SRID prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialValue {
    pub srid: Option<u32>,
    pub wkt: String,
}

impl Value {
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        use Value::*;
        let kind = match self {
            Null => return None,
            Boolean(_) => PrimitiveKind::Boolean,
            Int32(_) => PrimitiveKind::Int32,
            Int64(_) => PrimitiveKind::Int64,
            Single(_) => PrimitiveKind::Single,
            Double(_) => PrimitiveKind::Double,
            Decimal(_) => PrimitiveKind::Decimal,
            String(_) => PrimitiveKind::String,
            Binary(_) => PrimitiveKind::Binary,
            Guid(_) => PrimitiveKind::Guid,
            DateTime(_) => PrimitiveKind::DateTime,
            DateTimeOffset(_) => PrimitiveKind::DateTimeOffset,
            Time(_) => PrimitiveKind::Time,
            Geography(_) => PrimitiveKind::Geography,
            Geometry(_) => PrimitiveKind::Geometry,
        };
        Some(kind)
    }

    /// Literals are never nullable; `null` itself has no type.
    pub fn type_ref(&self) -> Option<TypeReference> {
        self.primitive_kind()
            .map(|kind| TypeReference::primitive(kind, false))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}
