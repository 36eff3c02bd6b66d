//! Serialization of token and node trees.
//!
//! - [`to_query_text`] turns a token tree back into query text. Literals are
//!   written from their preserved raw text and parentheses are inserted only
//!   where precedence requires them, so re-parsing the output yields an equal tree.
//! - [`token_to_json`] and [`node_to_json`] produce `serde_json` trees for
//!   diagnostics; every object carries a `"kind"` field. Both refuse trees
//!   nested deeper than [`DEFAULT_MAX_TREE_DEPTH`].
//!
//! # Examples
//!
//! ```
//! use odata_query::output::to_query_text;
//! use odata_query::parser::Parser;
//!
//! let token = Parser::new("(1 add 2)  mul 3").and_then(Parser::parse_filter).unwrap();
//! assert_eq!(to_query_text(&token), "(1 add 2) mul 3");
//! ```

use serde_json::{Map, Value as JsonValue, json};

use crate::{
    ast::{
        BinaryOperatorKind, NamedValue, OrderByToken, OrderDirection, QueryToken,
        UnaryOperatorKind,
    },
    edm::TypeReference,
    error::{QueryError, Result},
    semantic::{QueryNode, RangeVariable},
    settings::DEFAULT_MAX_TREE_DEPTH,
    value::Value,
};

const UNARY_PRECEDENCE: u8 = 6;
const PRIMARY_PRECEDENCE: u8 = 7;

/// Canonical query text for a token tree.
pub fn to_query_text(token: &QueryToken) -> String {
    match token {
        QueryToken::Literal(literal) => literal.raw_text.clone(),
        QueryToken::BinaryOperator { op, left, right } => {
            let own = binary_precedence(*op);
            let left = wrap(left, precedence(left) < own);
            let right = wrap(right, precedence(right) <= own);
            format!("{} {} {}", left, op.keyword(), right)
        }
        QueryToken::UnaryOperator { op, operand } => {
            let parenthesize = precedence(operand) < UNARY_PRECEDENCE
                || (*op == UnaryOperatorKind::Negate && starts_with_number(operand));
            let operand = wrap(operand, parenthesize);
            match op {
                UnaryOperatorKind::Negate => format!("-{}", operand),
                UnaryOperatorKind::Not => format!("not {}", operand),
            }
        }
        QueryToken::PropertyAccess { name, instance } => with_instance(instance.as_deref(), name),
        QueryToken::FunctionCall { name, args } => {
            let args: Vec<String> = args.iter().map(to_query_text).collect();
            format!("{}({})", name, args.join(","))
        }
        QueryToken::Any {
            source,
            parameter,
            body,
        } => with_instance(source.as_deref(), &lambda_text("any", parameter.as_deref(), body)),
        QueryToken::All {
            source,
            parameter,
            body,
        } => with_instance(source.as_deref(), &lambda_text("all", parameter.as_deref(), body)),
        QueryToken::Star { instance } => with_instance(instance.as_deref(), "*"),
        QueryToken::Parameter { name } => name.clone(),
        QueryToken::Cast {
            type_name,
            instance,
        } => with_instance(instance.as_deref(), type_name),
        QueryToken::Segment { name, key, parent } => {
            let segment = if key.is_empty() {
                name.clone()
            } else {
                format!("{}({})", name, key_text(key))
            };
            with_instance(parent.as_deref(), &segment)
        }
    }
}

fn binary_precedence(op: BinaryOperatorKind) -> u8 {
    match op {
        BinaryOperatorKind::Or => 1,
        BinaryOperatorKind::And => 2,
        BinaryOperatorKind::Add | BinaryOperatorKind::Subtract => 4,
        BinaryOperatorKind::Multiply | BinaryOperatorKind::Divide | BinaryOperatorKind::Modulo => 5,
        _ => 3,
    }
}

fn precedence(token: &QueryToken) -> u8 {
    match token {
        QueryToken::BinaryOperator { op, .. } => binary_precedence(*op),
        QueryToken::UnaryOperator { .. } => UNARY_PRECEDENCE,
        _ => PRIMARY_PRECEDENCE,
    }
}

fn wrap(token: &QueryToken, parenthesize: bool) -> String {
    if parenthesize {
        format!("({})", to_query_text(token))
    } else {
        to_query_text(token)
    }
}

/// `-` in front of a numeric literal would be folded into it on re-parse.
fn starts_with_number(token: &QueryToken) -> bool {
    match token {
        QueryToken::Literal(literal) => literal
            .value
            .primitive_kind()
            .is_some_and(|kind| kind.is_numeric()),
        QueryToken::PropertyAccess {
            instance: Some(inner),
            ..
        }
        | QueryToken::Star {
            instance: Some(inner),
        }
        | QueryToken::Cast {
            instance: Some(inner),
            ..
        }
        | QueryToken::Any {
            source: Some(inner),
            ..
        }
        | QueryToken::All {
            source: Some(inner),
            ..
        } => precedence(inner) == PRIMARY_PRECEDENCE && starts_with_number(inner),
        _ => false,
    }
}

fn with_instance(instance: Option<&QueryToken>, member: &str) -> String {
    match instance {
        Some(instance) => format!(
            "{}/{}",
            wrap(instance, precedence(instance) < PRIMARY_PRECEDENCE),
            member
        ),
        None => member.to_string(),
    }
}

fn lambda_text(operator: &str, parameter: Option<&str>, body: &QueryToken) -> String {
    match parameter {
        Some(parameter) => format!("{}({}:{})", operator, parameter, to_query_text(body)),
        None => format!("{}()", operator),
    }
}

fn key_text(key: &[NamedValue]) -> String {
    key.iter()
        .map(|value| match &value.name {
            Some(name) => format!("{}={}", name, value.literal.raw_text),
            None => value.literal.raw_text.clone(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Canonical `$orderby` text; `asc` is the default and is omitted.
pub fn order_by_text(items: &[OrderByToken]) -> String {
    items
        .iter()
        .map(|item| match item.direction {
            OrderDirection::Ascending => to_query_text(&item.expression),
            OrderDirection::Descending => format!("{} desc", to_query_text(&item.expression)),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Canonical `$select` / `$expand` text.
pub fn paths_text(paths: &[QueryToken]) -> String {
    paths.iter().map(to_query_text).collect::<Vec<_>>().join(",")
}

/// JSON diagnostics tree for a token.
pub fn token_to_json(token: &QueryToken) -> Result<JsonValue> {
    token_json(token, 0)
}

fn enter(depth: usize) -> Result<usize> {
    if depth >= DEFAULT_MAX_TREE_DEPTH {
        return Err(QueryError::RecursionLimit {
            limit: DEFAULT_MAX_TREE_DEPTH,
            position: None,
        });
    }
    Ok(depth + 1)
}

fn token_json(token: &QueryToken, depth: usize) -> Result<JsonValue> {
    let depth = enter(depth)?;
    let optional = |token: Option<&QueryToken>| match token {
        Some(token) => token_json(token, depth),
        None => Ok(JsonValue::Null),
    };

    let mut object = Map::new();
    object.insert("kind".to_string(), json!(token.kind_name()));
    match token {
        QueryToken::Literal(literal) => {
            object.insert("value".to_string(), value_to_json(&literal.value));
            object.insert("text".to_string(), json!(literal.raw_text));
        }
        QueryToken::BinaryOperator { op, left, right } => {
            object.insert("operator".to_string(), json!(op.keyword()));
            object.insert("left".to_string(), token_json(left, depth)?);
            object.insert("right".to_string(), token_json(right, depth)?);
        }
        QueryToken::UnaryOperator { op, operand } => {
            object.insert("operator".to_string(), json!(op.keyword()));
            object.insert("operand".to_string(), token_json(operand, depth)?);
        }
        QueryToken::PropertyAccess { name, instance } => {
            object.insert("name".to_string(), json!(name));
            object.insert("instance".to_string(), optional(instance.as_deref())?);
        }
        QueryToken::FunctionCall { name, args } => {
            let args = args
                .iter()
                .map(|arg| token_json(arg, depth))
                .collect::<Result<Vec<_>>>()?;
            object.insert("name".to_string(), json!(name));
            object.insert("arguments".to_string(), JsonValue::Array(args));
        }
        QueryToken::Any {
            source,
            parameter,
            body,
        }
        | QueryToken::All {
            source,
            parameter,
            body,
        } => {
            object.insert("source".to_string(), optional(source.as_deref())?);
            object.insert("parameter".to_string(), json!(parameter));
            object.insert("body".to_string(), token_json(body, depth)?);
        }
        QueryToken::Star { instance } => {
            object.insert("instance".to_string(), optional(instance.as_deref())?);
        }
        QueryToken::Parameter { name } => {
            object.insert("name".to_string(), json!(name));
        }
        QueryToken::Cast {
            type_name,
            instance,
        } => {
            object.insert("type".to_string(), json!(type_name));
            object.insert("instance".to_string(), optional(instance.as_deref())?);
        }
        QueryToken::Segment { name, key, parent } => {
            let key: Vec<JsonValue> = key.iter().map(named_value_to_json).collect();
            object.insert("name".to_string(), json!(name));
            object.insert("key".to_string(), JsonValue::Array(key));
            object.insert("parent".to_string(), optional(parent.as_deref())?);
        }
    }
    Ok(JsonValue::Object(object))
}

fn named_value_to_json(value: &NamedValue) -> JsonValue {
    json!({
        "name": value.name,
        "value": value_to_json(&value.literal.value),
        "text": value.literal.raw_text,
    })
}

/// JSON diagnostics tree for a bound node; every object carries its `"type"`.
pub fn node_to_json(node: &QueryNode) -> Result<JsonValue> {
    node_json(node, 0)
}

fn node_json(node: &QueryNode, depth: usize) -> Result<JsonValue> {
    let depth = enter(depth)?;
    let mut object = Map::new();
    object.insert("kind".to_string(), json!(node.kind_name()));
    object.insert("type".to_string(), type_to_json(node.type_ref()));

    match node {
        QueryNode::Constant {
            value, raw_text, ..
        } => {
            object.insert("value".to_string(), value_to_json(value));
            object.insert("text".to_string(), json!(raw_text));
        }
        QueryNode::BinaryOperator {
            op, left, right, ..
        } => {
            object.insert("operator".to_string(), json!(op.keyword()));
            object.insert("left".to_string(), node_json(left, depth)?);
            object.insert("right".to_string(), node_json(right, depth)?);
        }
        QueryNode::UnaryOperator { op, operand, .. } => {
            object.insert("operator".to_string(), json!(op.keyword()));
            object.insert("operand".to_string(), node_json(operand, depth)?);
        }
        QueryNode::RangeVariable { name, .. } => {
            object.insert("name".to_string(), json!(name));
        }
        QueryNode::PropertyAccess {
            source,
            name,
            navigation,
            ..
        } => {
            object.insert("name".to_string(), json!(name));
            object.insert("navigation".to_string(), json!(navigation));
            object.insert("source".to_string(), node_json(source, depth)?);
        }
        QueryNode::FunctionCall {
            name,
            args,
            operation,
            ..
        } => {
            let operation = operation.as_ref().map_or(JsonValue::Null, |operation| {
                json!({
                    "kind": format!("{:?}", operation.kind),
                    "id": operation.id,
                })
            });
            let args = args
                .iter()
                .map(|arg| node_json(arg, depth))
                .collect::<Result<Vec<_>>>()?;
            object.insert("name".to_string(), json!(name));
            object.insert("operation".to_string(), operation);
            object.insert("arguments".to_string(), JsonValue::Array(args));
        }
        QueryNode::Any {
            source,
            parameter,
            body,
            ..
        }
        | QueryNode::All {
            source,
            parameter,
            body,
            ..
        } => {
            object.insert("source".to_string(), node_json(source, depth)?);
            object.insert(
                "parameter".to_string(),
                parameter.as_ref().map_or(JsonValue::Null, range_variable_to_json),
            );
            object.insert("body".to_string(), node_json(body, depth)?);
        }
        QueryNode::Cast { source, .. } => {
            object.insert("source".to_string(), node_json(source, depth)?);
        }
        QueryNode::Wildcard { source } => {
            let source = match source {
                Some(source) => node_json(source, depth)?,
                None => JsonValue::Null,
            };
            object.insert("source".to_string(), source);
        }
    }
    Ok(JsonValue::Object(object))
}

pub fn range_variable_to_json(variable: &RangeVariable) -> JsonValue {
    json!({
        "name": variable.name,
        "type": type_to_json(variable.type_ref.as_ref()),
    })
}

fn type_to_json(type_ref: Option<&TypeReference>) -> JsonValue {
    match type_ref {
        Some(t) => json!({ "name": t.full_name(), "nullable": t.nullable }),
        None => JsonValue::Null,
    }
}

/// JSON rendering of a literal value; types JSON cannot represent exactly become strings.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => json!(b),
        Value::Int32(n) => json!(n),
        Value::Int64(n) => json!(n),
        Value::Single(n) => float_to_json(f64::from(*n)),
        Value::Double(n) => float_to_json(*n),
        Value::Decimal(d) => json!(d.to_string()),
        Value::String(s) => json!(s),
        Value::Binary(bytes) => json!(hex::encode_upper(bytes)),
        Value::Guid(guid) => json!(guid.to_string()),
        Value::DateTime(dt) => json!(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        Value::DateTimeOffset(dt) => json!(dt.to_rfc3339()),
        Value::Time(delta) => json!(delta.to_string()),
        Value::Geography(spatial) | Value::Geometry(spatial) => json!({
            "srid": spatial.srid,
            "wkt": spatial.wkt,
        }),
    }
}

fn float_to_json(n: f64) -> JsonValue {
    serde_json::Number::from_f64(n)
        .map(JsonValue::Number)
        .unwrap_or_else(|| json!(n.to_string()))
}
