//! Front end for OData query options.
//!
//! Text flows through three stages:
//!
//! 1. [`Lexer`] splits the option value into tokens
//! 2. [`Parser`] builds a [`QueryToken`] tree (pure syntax, literal values resolved)
//! 3. [`Binder`] resolves names and types against an [`edm::EdmModel`],
//!    producing a typed [`QueryNode`] tree
//!
//! ```
//! use odata_query::edm::{Model, StructuredType, TypeReference};
//! use odata_query::Binder;
//!
//! let mut model = Model::new();
//! model.add_type(
//!     StructuredType::entity("Shop", "Order")
//!         .with_property("Amount", TypeReference::decimal(false)),
//! );
//!
//! let token = odata_query::parse_filter("Amount gt 100m").unwrap();
//! let filter = Binder::new(&model, TypeReference::structured("Shop.Order", false))
//!     .bind_filter(&token)
//!     .unwrap();
//! assert!(filter.expression.type_ref().unwrap().is_boolean());
//! ```

pub mod ast;
pub mod cli;
pub mod edm;
pub mod error;
pub mod functions;
pub mod lexer;
pub mod literal;
pub mod options;
pub mod output;
pub mod parser;
pub mod semantic;
pub mod settings;
pub mod value;

pub use ast::{LiteralToken, OrderByToken, QueryToken, Token, TokenKind};
pub use edm::{EdmModel, Model, TypeReference};
pub use error::{QueryError, Result};
pub use functions::FunctionCatalog;
pub use lexer::Lexer;
pub use options::QueryOptions;
pub use output::{node_to_json, to_query_text, token_to_json};
pub use parser::Parser;
pub use semantic::{Binder, QueryNode};
pub use settings::ParserSettings;
pub use value::Value;

/// Parses a `$filter` value with default settings.
pub fn parse_filter(text: &str) -> Result<QueryToken> {
    Parser::new(text)?.parse_filter()
}

/// Parses a `$orderby` value with default settings.
pub fn parse_order_by(text: &str) -> Result<Vec<OrderByToken>> {
    Parser::new(text)?.parse_order_by()
}

/// Parses a `$select` value with default settings.
pub fn parse_select(text: &str) -> Result<ast::SelectToken> {
    Parser::new(text)?.parse_select()
}

/// Parses a `$expand` value with default settings.
pub fn parse_expand(text: &str) -> Result<ast::ExpandToken> {
    Parser::new(text)?.parse_expand()
}
