//! # Query Token Model
//!
//! This module defines the syntax tree produced by the parser for the OData
//! query options `$filter`, `$orderby`, `$select` and `$expand`. The tree is a
//! faithful record of the input text: it carries no type information beyond the
//! types of literal values.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - [`QueryToken`], the closed set of syntax nodes
//! - **[operators]** - Binary and unary operator kinds
//! - **[query]** - Clause-level tokens (`$orderby` items, `$select`, `$expand`)
//! - **[named_value]** - Key values for `(1)` / `(Id=1,Name='x')` predicates
//!
//! ## Quick Start
//!
//! ```text
//! Orders/any(o: o/Amount gt 100) and startswith(Name,'A')
//! ```
//!
//! parses to
//!
//! ```text
//! BinaryOperator(And,
//!     Any { source: PropertyAccess(Orders), parameter: o,
//!           body: BinaryOperator(GreaterThan,
//!                                PropertyAccess(Amount, PropertyAccess(o)),
//!                                Literal(100)) },
//!     FunctionCall(startswith, [PropertyAccess(Name), Literal('A')]))
//! ```
//!
//! ## Operator Precedence
//!
//! From loosest to tightest: `or`, `and`, comparisons (`eq ne gt ge lt le`),
//! additive (`add sub`), multiplicative (`mul div mod`), unary (`-`, `not`),
//! then member access with `/`.
//!
//! A `-` directly in front of a numeric literal is folded into the literal, so
//! `-5` is `Literal(-5)` while `-(5)` is `UnaryOperator(Negate, Literal(5))`.
pub mod expressions;
pub mod named_value;
pub mod operators;
pub mod query;
pub mod tokens;

pub use expressions::{LiteralToken, QueryToken};
pub use named_value::NamedValue;
pub use operators::{BinaryOperatorKind, UnaryOperatorKind};
pub use query::{CustomQueryOption, ExpandToken, OrderByToken, OrderDirection, SelectToken};
pub use tokens::{Token, TokenKind};
