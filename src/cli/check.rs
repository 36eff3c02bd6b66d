//! Parse (and optionally bind) a single query option value

use serde_json::{Value as JsonValue, json};
use tracing::debug;

use super::CliError;
use crate::{
    Binder, Model, ParserSettings, Parser, QueryError, TypeReference,
    ast::{ExpandToken, OrderDirection, SelectToken},
    edm::EdmModel,
    output::{node_to_json, range_variable_to_json, token_to_json},
    semantic::SelectExpandClause,
};

/// Which query option the expression is the value of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionKind {
    #[default]
    Filter,
    OrderBy,
    Select,
    Expand,
}

impl OptionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_start_matches('$') {
            "filter" => Some(OptionKind::Filter),
            "orderby" => Some(OptionKind::OrderBy),
            "select" => Some(OptionKind::Select),
            "expand" => Some(OptionKind::Expand),
            _ => None,
        }
    }
}

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The option value to check
    pub expression: String,
    pub option: OptionKind,
    /// Model to bind against; binding is skipped without one
    pub model: Option<Model>,
    /// Full name of the entity type `$it` refers to
    pub entity_type: Option<String>,
    /// Only validate syntax, don't bind
    pub syntax_only: bool,
    pub settings: ParserSettings,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Token tree of a syntactically valid expression
    Parsed(JsonValue),
    /// Bound node tree
    Bound(JsonValue),
}

/// Execute an odq check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let parser = Parser::with_settings(&options.expression, options.settings)?;
    let it_type = binding_target(options)?;
    debug!(option = ?options.option, bind = it_type.is_some(), "checking expression");

    match options.option {
        OptionKind::Filter => {
            let token = parser.parse_filter()?;
            if options.syntax_only {
                return Ok(CheckResult::SyntaxValid);
            }
            let Some((model, it_type)) = it_type else {
                return Ok(CheckResult::Parsed(token_to_json(&token)?));
            };
            let clause = Binder::new(model, it_type).bind_filter(&token)?;
            Ok(CheckResult::Bound(json!({
                "range_variable": range_variable_to_json(&clause.range_variable),
                "expression": node_to_json(&clause.expression)?,
            })))
        }
        OptionKind::OrderBy => {
            let items = parser.parse_order_by()?;
            if options.syntax_only {
                return Ok(CheckResult::SyntaxValid);
            }
            let Some((model, it_type)) = it_type else {
                let tokens = items
                    .iter()
                    .map(|item| Ok(order_by_json(token_to_json(&item.expression)?, item.direction)))
                    .collect::<Result<Vec<_>, QueryError>>()?;
                return Ok(CheckResult::Parsed(JsonValue::Array(tokens)));
            };
            let clauses = Binder::new(model, it_type).bind_order_by(&items)?;
            let nodes = clauses
                .iter()
                .map(|clause| {
                    let expression = node_to_json(&clause.expression)?;
                    Ok(order_by_json(expression, clause.direction))
                })
                .collect::<Result<Vec<_>, QueryError>>()?;
            Ok(CheckResult::Bound(JsonValue::Array(nodes)))
        }
        OptionKind::Select | OptionKind::Expand => {
            let expand = options.option == OptionKind::Expand;
            let items = if expand {
                parser.parse_expand()?.properties
            } else {
                parser.parse_select()?.properties
            };
            if options.syntax_only {
                return Ok(CheckResult::SyntaxValid);
            }
            let Some((model, it_type)) = it_type else {
                let tokens = items.iter().map(token_to_json).collect::<Result<Vec<_>, _>>()?;
                return Ok(CheckResult::Parsed(JsonValue::Array(tokens)));
            };
            let mut binder = Binder::new(model, it_type);
            let clause = if expand {
                binder.bind_expand(&ExpandToken { properties: items })?
            } else {
                binder.bind_select(&SelectToken { properties: items })?
            };
            Ok(CheckResult::Bound(select_expand_json(&clause)?))
        }
    }
}

/// The model and `$it` type to bind with, when binding was requested.
fn binding_target(options: &CheckOptions) -> Result<Option<(&Model, TypeReference)>, CliError> {
    match (&options.model, &options.entity_type) {
        (None, None) => Ok(None),
        (Some(model), Some(entity_type)) => {
            if model.find_structured_type(entity_type).is_none() {
                return Err(CliError::Schema(format!(
                    "entity type '{}' is not defined in the schema",
                    entity_type
                )));
            }
            Ok(Some((model, TypeReference::structured(entity_type, false))))
        }
        _ => Err(CliError::IncompleteBinding),
    }
}

fn order_by_json(expression: JsonValue, direction: OrderDirection) -> JsonValue {
    json!({
        "expression": expression,
        "direction": direction.keyword(),
    })
}

fn select_expand_json(clause: &SelectExpandClause) -> Result<JsonValue, QueryError> {
    let paths = clause.paths.iter().map(node_to_json).collect::<Result<Vec<_>, _>>()?;
    Ok(json!({
        "wildcard": clause.wildcard,
        "paths": paths,
    }))
}
