//! JSON schema files for `odq check --schema`.
//!
//! ```json
//! {
//!   "namespace": "Shop",
//!   "types": [
//!     {
//!       "name": "Order",
//!       "kind": "entity",
//!       "base": "Shop.Item",
//!       "open": false,
//!       "properties": [
//!         { "name": "Amount", "type": "Edm.Decimal", "nullable": false },
//!         { "name": "Lines", "type": "Collection(Shop.Line)", "navigation": true }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! A type may override the file's `namespace`. `kind` defaults to `entity`,
//! `nullable` to `true`, `navigation` and `open` to `false`.

use std::{fs, path::Path};

use serde_json::Value as JsonValue;
use tracing::debug;

use super::CliError;
use crate::edm::{EdmModel, Model, StructuredType, TypeReference};

pub fn load_schema(path: &Path) -> Result<Model, CliError> {
    let text = fs::read_to_string(path)?;
    parse_schema(&text)
}

pub fn parse_schema(text: &str) -> Result<Model, CliError> {
    let json: JsonValue = serde_json::from_str(text)?;
    let default_namespace = json.get("namespace").and_then(JsonValue::as_str).unwrap_or("");
    let types = json
        .get("types")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| invalid("missing \"types\" array"))?;

    let mut model = Model::new();
    for entry in types {
        let ty = parse_type(entry, default_namespace)?;
        debug!(type_name = %ty.full_name(), properties = ty.properties.len(), "loaded schema type");
        model.add_type(ty);
    }

    // Base types must resolve once every type is loaded
    for ty in model.types() {
        if let Some(base) = &ty.base_type
            && model.find_structured_type(base).is_none()
        {
            return Err(invalid(format!(
                "type '{}' derives from unknown type '{}'",
                ty.full_name(),
                base
            )));
        }
    }
    Ok(model)
}

fn parse_type(entry: &JsonValue, default_namespace: &str) -> Result<StructuredType, CliError> {
    let name = string_field(entry, "name")?;
    let namespace = entry
        .get("namespace")
        .and_then(JsonValue::as_str)
        .unwrap_or(default_namespace);

    let mut ty = match entry.get("kind").and_then(JsonValue::as_str).unwrap_or("entity") {
        "entity" => StructuredType::entity(namespace, name),
        "complex" => StructuredType::complex(namespace, name),
        other => return Err(invalid(format!("type '{}' has unknown kind '{}'", name, other))),
    };
    if let Some(base) = entry.get("base").and_then(JsonValue::as_str) {
        ty = ty.with_base_type(base);
    }
    if bool_field(entry, "open", false) {
        ty = ty.open();
    }

    let properties: &[JsonValue] = match entry.get("properties") {
        Some(properties) => properties
            .as_array()
            .ok_or_else(|| invalid(format!("\"properties\" of '{}' must be an array", name)))?
            .as_slice(),
        None => &[],
    };
    for property in properties {
        let property_name = string_field(property, "name")?;
        let type_name = string_field(property, "type")?;
        let nullable = bool_field(property, "nullable", true);
        let type_ref = TypeReference::parse(type_name, nullable).ok_or_else(|| {
            invalid(format!(
                "property '{}.{}' has invalid type '{}'",
                name, property_name, type_name
            ))
        })?;

        ty = if bool_field(property, "navigation", false) {
            ty.with_navigation(property_name, type_ref)
        } else {
            ty.with_property(property_name, type_ref)
        };
    }
    Ok(ty)
}

fn string_field<'a>(value: &'a JsonValue, field: &str) -> Result<&'a str, CliError> {
    value
        .get(field)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| invalid(format!("missing string field \"{}\" in {}", field, value)))
}

fn bool_field(value: &JsonValue, field: &str, default: bool) -> bool {
    value.get(field).and_then(JsonValue::as_bool).unwrap_or(default)
}

fn invalid(message: impl Into<String>) -> CliError {
    CliError::Schema(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schema() {
        let model = parse_schema(
            r#"{
                "namespace": "Shop",
                "types": [
                    { "name": "Line", "kind": "complex",
                      "properties": [{ "name": "Qty", "type": "Edm.Int32", "nullable": false }] },
                    { "name": "Order", "open": true,
                      "properties": [
                        { "name": "Lines", "type": "Collection(Shop.Line)", "navigation": true }
                      ] }
                ]
            }"#,
        )
        .unwrap();

        let order = model.find_structured_type("Shop.Order").unwrap();
        assert!(order.open);
        let lines = order.find_declared_property("Lines").unwrap();
        assert!(lines.navigation);
        assert_eq!(lines.type_ref.full_name(), "Collection(Shop.Line)");

        let line = model.find_structured_type("Shop.Line").unwrap();
        assert_eq!(
            line.find_declared_property("Qty").unwrap().type_ref,
            TypeReference::int32(false)
        );
    }

    #[test]
    fn test_unknown_base_type() {
        let result = parse_schema(r#"{ "types": [{ "name": "A", "base": "Nope" }] }"#);
        assert!(matches!(result, Err(CliError::Schema(_))));
    }

    #[test]
    fn test_invalid_property_type() {
        let result = parse_schema(
            r#"{ "types": [{ "name": "A",
                 "properties": [{ "name": "X", "type": "Edm.Bogus" }] }] }"#,
        );
        assert!(matches!(result, Err(CliError::Schema(_))));
    }
}
