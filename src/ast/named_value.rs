use crate::ast::LiteralToken;

/// A key value inside parentheses: positional `(1)` or named `(OrderId=1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    /// `None` for a positional value
    pub name: Option<String>,
    pub literal: LiteralToken,
}
