//! Split a full query string and show each option

use serde_json::{Map, Value as JsonValue, json};

use super::CliError;
use crate::{
    ParserSettings, QueryOptions,
    output::{to_query_text, token_to_json},
};

/// Parses `query` and describes each option present, in canonical form.
///
/// The `"canonical"` key holds the whole query string re-serialized.
pub fn describe_options(query: &str, settings: &ParserSettings) -> Result<JsonValue, CliError> {
    let options = QueryOptions::parse(query, settings)?;
    let mut object = Map::new();
    object.insert("canonical".to_string(), json!(options.to_query_string()));

    if let Some(filter) = &options.filter {
        object.insert(
            "$filter".to_string(),
            json!({ "text": to_query_text(filter), "tree": token_to_json(filter)? }),
        );
    }
    if let Some(items) = &options.order_by {
        let items: Vec<JsonValue> = items
            .iter()
            .map(|item| {
                json!({
                    "text": to_query_text(&item.expression),
                    "direction": item.direction.keyword(),
                })
            })
            .collect();
        object.insert("$orderby".to_string(), JsonValue::Array(items));
    }
    if let Some(select) = &options.select {
        let items: Vec<String> = select.properties.iter().map(to_query_text).collect();
        object.insert("$select".to_string(), json!(items));
    }
    if let Some(expand) = &options.expand {
        let items: Vec<String> = expand.properties.iter().map(to_query_text).collect();
        object.insert("$expand".to_string(), json!(items));
    }
    if let Some(top) = options.top {
        object.insert("$top".to_string(), json!(top));
    }
    if let Some(skip) = options.skip {
        object.insert("$skip".to_string(), json!(skip));
    }
    if let Some(inline_count) = options.inline_count {
        object.insert("$inlinecount".to_string(), json!(inline_count.keyword()));
    }
    if let Some(skip_token) = &options.skip_token {
        object.insert("$skiptoken".to_string(), json!(skip_token));
    }
    if let Some(format) = &options.format {
        object.insert("$format".to_string(), json!(format));
    }
    if !options.custom.is_empty() {
        let custom: Vec<JsonValue> = options
            .custom
            .iter()
            .map(|option| json!({ "name": option.name, "value": option.value }))
            .collect();
        object.insert("custom".to_string(), JsonValue::Array(custom));
    }

    Ok(JsonValue::Object(object))
}
