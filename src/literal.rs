//! Conversion of literal token text into typed values.
//!
//! Every literal token kind maps to one primitive type; the raw text is parsed
//! with that type's rules and any failure is reported as
//! [`QueryError::LiteralFormat`] carrying the `Edm` type name, the offending text
//! and its position.

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use regex::Regex;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    ast::{LiteralToken, Token, TokenKind},
    edm::PrimitiveKind,
    error::{QueryError, Result},
    value::{SpatialValue, Value},
};

const DURATION_PATTERN: &str =
    r"^(-)?P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.(\d+))?S)?)?$";

const SPATIAL_PATTERN: &str = r"^(?i:SRID=(\d+);)?\s*([A-Za-z]+)\s*(\(.*\)|EMPTY)\s*$";

const SPATIAL_KINDS: [&str; 8] = [
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
    "GEOMETRYCOLLECTION",
    "COLLECTION",
];

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// The primitive kind a literal token kind produces; `None` for `null` and non-literals.
pub fn literal_kind(kind: TokenKind) -> Option<PrimitiveKind> {
    let primitive = match kind {
        TokenKind::BooleanLiteral => PrimitiveKind::Boolean,
        TokenKind::Int32Literal => PrimitiveKind::Int32,
        TokenKind::Int64Literal => PrimitiveKind::Int64,
        TokenKind::SingleLiteral => PrimitiveKind::Single,
        TokenKind::DoubleLiteral => PrimitiveKind::Double,
        TokenKind::DecimalLiteral => PrimitiveKind::Decimal,
        TokenKind::StringLiteral => PrimitiveKind::String,
        TokenKind::DateTimeLiteral => PrimitiveKind::DateTime,
        TokenKind::DateTimeOffsetLiteral => PrimitiveKind::DateTimeOffset,
        TokenKind::TimeLiteral => PrimitiveKind::Time,
        TokenKind::GuidLiteral => PrimitiveKind::Guid,
        TokenKind::BinaryLiteral => PrimitiveKind::Binary,
        TokenKind::GeographyLiteral => PrimitiveKind::Geography,
        TokenKind::GeometryLiteral => PrimitiveKind::Geometry,
        _ => return None,
    };
    Some(primitive)
}

/// Resolves a literal token into a [`LiteralToken`] holding the typed value and raw text.
pub fn resolve_literal(token: &Token) -> Result<LiteralToken> {
    let value = parse_literal_value(token.kind, &token.text, token.position)?;
    Ok(LiteralToken {
        value,
        raw_text: token.text.clone(),
    })
}

/// Parses literal text of the given token kind.
pub fn parse_literal_value(kind: TokenKind, text: &str, position: usize) -> Result<Value> {
    if kind == TokenKind::NullLiteral {
        return Ok(Value::Null);
    }

    let Some(primitive) = literal_kind(kind) else {
        return Err(QueryError::syntax(
            format!("Expected a literal, found {}", kind.describe()),
            text,
            position,
        ));
    };
    let invalid = || QueryError::literal_format(primitive.full_name(), text, position);

    let value = match primitive {
        PrimitiveKind::Boolean => match text {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => return Err(invalid()),
        },
        PrimitiveKind::Int32 => Value::Int32(text.parse().map_err(|_| invalid())?),
        PrimitiveKind::Int64 => {
            let digits = strip_suffix(text, ['L', 'l']);
            Value::Int64(digits.parse().map_err(|_| invalid())?)
        }
        PrimitiveKind::Single => {
            let digits = strip_suffix(text, ['F', 'f']);
            let parsed = parse_special_float(digits)
                .or_else(|| digits.parse::<f32>().ok().map(f64::from));
            Value::Single(parsed.ok_or_else(invalid)? as f32)
        }
        PrimitiveKind::Double => {
            let digits = strip_suffix(text, ['D', 'd']);
            let parsed = parse_special_float(digits).or_else(|| digits.parse::<f64>().ok());
            Value::Double(parsed.ok_or_else(invalid)?)
        }
        PrimitiveKind::Decimal => {
            let digits = strip_suffix(text, ['M', 'm']);
            let parsed = if digits.contains(['e', 'E']) {
                Decimal::from_scientific(digits)
            } else {
                digits.parse::<Decimal>()
            };
            Value::Decimal(parsed.map_err(|_| invalid())?)
        }
        PrimitiveKind::String => Value::String(quoted_body(text).ok_or_else(invalid)?),
        PrimitiveKind::DateTime => {
            let body = quoted_body(text).ok_or_else(invalid)?;
            let parsed = DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(&body, format).ok());
            Value::DateTime(parsed.ok_or_else(invalid)?)
        }
        PrimitiveKind::DateTimeOffset => {
            let body = quoted_body(text).ok_or_else(invalid)?;
            Value::DateTimeOffset(DateTime::parse_from_rfc3339(&body).map_err(|_| invalid())?)
        }
        PrimitiveKind::Time => {
            let body = quoted_body(text).ok_or_else(invalid)?;
            Value::Time(parse_duration(&body).ok_or_else(invalid)?)
        }
        PrimitiveKind::Guid => {
            let body = quoted_body(text).ok_or_else(invalid)?;
            Value::Guid(Uuid::parse_str(&body).map_err(|_| invalid())?)
        }
        PrimitiveKind::Binary => {
            let body = quoted_body(text).ok_or_else(invalid)?;
            Value::Binary(hex::decode(&body).map_err(|_| invalid())?)
        }
        PrimitiveKind::Geography => {
            let body = quoted_body(text).ok_or_else(invalid)?;
            Value::Geography(parse_spatial(&body).ok_or_else(invalid)?)
        }
        PrimitiveKind::Geometry => {
            let body = quoted_body(text).ok_or_else(invalid)?;
            Value::Geometry(parse_spatial(&body).ok_or_else(invalid)?)
        }
    };
    Ok(value)
}

fn strip_suffix(text: &str, suffixes: [char; 2]) -> &str {
    text.strip_suffix(suffixes).unwrap_or(text)
}

/// `INF`, `-INF` and `NaN`, without their type suffix.
fn parse_special_float(text: &str) -> Option<f64> {
    match text {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => None,
    }
}

/// Text between the first quote and the closing quote, with `''` unescaped.
fn quoted_body(text: &str) -> Option<String> {
    let open = text.find('\'')?;
    let body = text[open + 1..].strip_suffix('\'')?;
    Some(body.replace("''", "'"))
}

/// Parses an xsd duration such as `P1DT2H30M15.5S` or `-PT45S`.
fn parse_duration(text: &str) -> Option<TimeDelta> {
    if text.ends_with('P') || text.ends_with('T') {
        return None;
    }
    let pattern = Regex::new(DURATION_PATTERN).ok()?;
    let captures = pattern.captures(text)?;

    let number = |index: usize| -> Option<i64> {
        match captures.get(index) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    let days = number(2)?;
    let hours = number(3)?;
    let minutes = number(4)?;
    let seconds = number(5)?;

    let total_seconds = days
        .checked_mul(86_400)?
        .checked_add(hours.checked_mul(3_600)?)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?;

    let nanos = match captures.get(6) {
        Some(fraction) => {
            let digits: String = fraction.as_str().chars().take(9).collect();
            format!("{:0<9}", digits).parse::<i64>().ok()?
        }
        None => 0,
    };

    let delta = TimeDelta::try_seconds(total_seconds)?.checked_add(&TimeDelta::nanoseconds(nanos))?;
    if captures.get(1).is_some() {
        Some(-delta)
    } else {
        Some(delta)
    }
}

/// Parses `[SRID=n;]KIND(...)` well-known text; only the outer shape is checked.
fn parse_spatial(text: &str) -> Option<SpatialValue> {
    let pattern = Regex::new(SPATIAL_PATTERN).ok()?;
    let captures = pattern.captures(text)?;

    let kind = captures.get(2)?.as_str().to_ascii_uppercase();
    if !SPATIAL_KINDS.contains(&kind.as_str()) {
        return None;
    }

    let mut depth: i32 = 0;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }

    let srid = match captures.get(1) {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };
    let wkt_start = captures.get(2)?.start();
    Some(SpatialValue {
        srid,
        wkt: text[wkt_start..].trim().to_string(),
    })
}
