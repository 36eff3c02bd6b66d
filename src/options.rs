//! Splitting of a full query string (`$filter=...&$top=10&x=y`) into its options.
//!
//! Each system option value is handed to the matching [`Parser`] entry point
//! with the caller's settings. Values are taken as-is: percent-decoding is the
//! job of the HTTP layer in front of this crate.
//!
//! Error positions are character offsets into the whole query string, a
//! leading `?` included, so errors inside a value point into the full input.

use std::collections::HashSet;

use tracing::debug;

use crate::{
    ast::{CustomQueryOption, ExpandToken, OrderByToken, QueryToken, SelectToken},
    error::{QueryError, Result},
    output::{order_by_text, paths_text, to_query_text},
    parser::Parser,
    settings::ParserSettings,
};

/// `$inlinecount` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineCount {
    AllPages,
    None,
}

impl InlineCount {
    pub fn keyword(self) -> &'static str {
        match self {
            InlineCount::AllPages => "allpages",
            InlineCount::None => "none",
        }
    }
}

/// The parsed options of one query string; absent options are `None`.
///
/// # Examples
///
/// ```
/// use odata_query::{options::QueryOptions, ParserSettings};
///
/// let settings = ParserSettings::default();
/// let options = QueryOptions::parse("$filter=Price gt 5&$top=10&debug=1", &settings).unwrap();
/// assert!(options.filter.is_some());
/// assert_eq!(options.top, Some(10));
/// assert_eq!(options.custom[0].name, "debug");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryOptions {
    pub filter: Option<QueryToken>,
    pub order_by: Option<Vec<OrderByToken>>,
    pub select: Option<SelectToken>,
    pub expand: Option<ExpandToken>,
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub inline_count: Option<InlineCount>,
    pub skip_token: Option<String>,
    pub format: Option<String>,
    /// Non-`$` options in input order
    pub custom: Vec<CustomQueryOption>,
}

impl QueryOptions {
    pub fn parse(query: &str, settings: &ParserSettings) -> Result<Self> {
        debug!(query, "parsing query options");
        let (query, mut offset) = match query.strip_prefix('?') {
            Some(rest) => (rest, 1),
            None => (query, 0),
        };

        let mut options = QueryOptions::default();
        let mut seen = HashSet::new();

        for pair in query.split('&') {
            let position = offset;
            offset += pair.chars().count() + 1;
            if pair.is_empty() {
                continue;
            }

            let (name, value) = match pair.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (pair, None),
            };

            if !name.starts_with('$') {
                options.custom.push(CustomQueryOption {
                    name: name.to_string(),
                    value: value.unwrap_or_default().to_string(),
                });
                continue;
            }

            if !seen.insert(name) {
                return Err(QueryError::syntax(
                    format!("Query option '{}' is specified more than once", name),
                    name,
                    position,
                ));
            }
            let Some(value) = value else {
                return Err(QueryError::syntax(
                    format!("Query option '{}' requires a value", name),
                    name,
                    position,
                ));
            };

            let value_position = position + name.chars().count() + 1;
            let in_value = |err: QueryError| err.offset_by(value_position);
            let parser = || Parser::with_settings(value, *settings);
            match name {
                "$filter" => {
                    let filter = parser().and_then(Parser::parse_filter).map_err(in_value)?;
                    options.filter = Some(filter);
                }
                "$orderby" => {
                    let items = parser().and_then(Parser::parse_order_by).map_err(in_value)?;
                    options.order_by = Some(items);
                }
                "$select" => {
                    let select = parser().and_then(Parser::parse_select).map_err(in_value)?;
                    options.select = Some(select);
                }
                "$expand" => {
                    let expand = parser().and_then(Parser::parse_expand).map_err(in_value)?;
                    options.expand = Some(expand);
                }
                "$top" => options.top = Some(parse_count(name, value, value_position)?),
                "$skip" => options.skip = Some(parse_count(name, value, value_position)?),
                "$inlinecount" => {
                    options.inline_count = Some(match value {
                        "allpages" => InlineCount::AllPages,
                        "none" => InlineCount::None,
                        _ => {
                            return Err(QueryError::syntax(
                                format!(
                                    "'$inlinecount' must be 'allpages' or 'none', found '{}'",
                                    value
                                ),
                                value,
                                value_position,
                            ));
                        }
                    })
                }
                "$skiptoken" => options.skip_token = Some(value.to_string()),
                "$format" => options.format = Some(value.to_string()),
                _ => {
                    return Err(QueryError::syntax(
                        format!("Unknown system query option '{}'", name),
                        name,
                        position,
                    ));
                }
            }
        }
        Ok(options)
    }

    /// Canonical query string for the options present, system options first
    /// in a fixed order, then custom options in input order.
    ///
    /// Parsing the result gives back equal options.
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(filter) = &self.filter {
            pairs.push(format!("$filter={}", to_query_text(filter)));
        }
        if let Some(items) = &self.order_by {
            pairs.push(format!("$orderby={}", order_by_text(items)));
        }
        if let Some(select) = &self.select {
            pairs.push(format!("$select={}", paths_text(&select.properties)));
        }
        if let Some(expand) = &self.expand {
            pairs.push(format!("$expand={}", paths_text(&expand.properties)));
        }
        if let Some(top) = self.top {
            pairs.push(format!("$top={}", top));
        }
        if let Some(skip) = self.skip {
            pairs.push(format!("$skip={}", skip));
        }
        if let Some(inline_count) = self.inline_count {
            pairs.push(format!("$inlinecount={}", inline_count.keyword()));
        }
        if let Some(skip_token) = &self.skip_token {
            pairs.push(format!("$skiptoken={}", skip_token));
        }
        if let Some(format) = &self.format {
            pairs.push(format!("$format={}", format));
        }
        for option in &self.custom {
            pairs.push(format!("{}={}", option.name, option.value));
        }
        pairs.join("&")
    }
}

/// `$top` / `$skip`: a non-negative integer.
fn parse_count(name: &str, value: &str, position: usize) -> Result<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QueryError::syntax(
            format!("'{}' must be a non-negative integer, found '{}'", name, value),
            value,
            position,
        ));
    }
    value.parse().map_err(|_| {
        QueryError::syntax(
            format!("'{}' value '{}' is out of range", name, value),
            value,
            position,
        )
    })
}
