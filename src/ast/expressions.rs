use crate::{
    ast::{BinaryOperatorKind, NamedValue, UnaryOperatorKind},
    value::Value,
};

/// Syntax-tree node produced by the parser.
///
/// Children are owned exclusively and built before their parents; a tree is
/// never mutated once returned. The only back-references are the `instance` /
/// `source` / `parent` fields that chain path segments.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryToken {
    /// Literal value with its original text
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 'Foo'
    /// datetime'2012-05-01T10:00'
    /// ```
    Literal(LiteralToken),

    /// Binary operation (logical, comparison, arithmetic)
    BinaryOperator {
        op: BinaryOperatorKind,
        left: Box<QueryToken>,
        right: Box<QueryToken>,
    },

    /// Unary operation (`-`, `not`)
    UnaryOperator {
        op: UnaryOperatorKind,
        operand: Box<QueryToken>,
    },

    /// Member access, optionally on a preceding path
    ///
    /// # Examples
    /// ```text
    /// Name              // instance: None
    /// Address/City      // instance: Some(Address)
    /// ```
    PropertyAccess {
        name: String,
        instance: Option<Box<QueryToken>>,
    },

    /// Canonical function call
    ///
    /// # Examples
    /// ```text
    /// startswith(Name,'A')
    /// geo.distance(Location,geography'POINT(0 0)')
    /// ```
    FunctionCall { name: String, args: Vec<QueryToken> },

    /// Existential lambda: `Orders/any(o: o/Amount gt 100)`
    ///
    /// `source` is `None` when the lambda starts the expression (implicit `$it`);
    /// `parameter` is `None` for the empty form `any()`.
    Any {
        source: Option<Box<QueryToken>>,
        parameter: Option<String>,
        body: Box<QueryToken>,
    },

    /// Universal lambda: `Orders/all(o: o/Shipped)`
    All {
        source: Option<Box<QueryToken>>,
        parameter: Option<String>,
        body: Box<QueryToken>,
    },

    /// Wildcard in `$select` / `$expand`, optionally under a path
    Star { instance: Option<Box<QueryToken>> },

    /// Implicit range variable reference (`$it`)
    Parameter { name: String },

    /// Type segment in a path: `Orders/Shop.VipOrder`
    Cast {
        type_name: String,
        instance: Option<Box<QueryToken>>,
    },

    /// Resource path segment with optional key values: `Customers(1)`
    Segment {
        name: String,
        key: Vec<NamedValue>,
        parent: Option<Box<QueryToken>>,
    },
}

/// A literal's typed value together with the exact text it was parsed from.
///
/// The raw text is kept so `1.50m` or `-5` re-serialize exactly as written.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralToken {
    pub value: Value,
    pub raw_text: String,
}

impl QueryToken {
    pub fn literal(value: Value, raw_text: impl Into<String>) -> Self {
        QueryToken::Literal(LiteralToken {
            value,
            raw_text: raw_text.into(),
        })
    }

    pub fn binary(op: BinaryOperatorKind, left: QueryToken, right: QueryToken) -> Self {
        QueryToken::BinaryOperator {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperatorKind, operand: QueryToken) -> Self {
        QueryToken::UnaryOperator {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn property(name: impl Into<String>, instance: Option<QueryToken>) -> Self {
        QueryToken::PropertyAccess {
            name: name.into(),
            instance: instance.map(Box::new),
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<QueryToken>) -> Self {
        QueryToken::FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// Short variant name, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            QueryToken::Literal(_) => "Literal",
            QueryToken::BinaryOperator { .. } => "BinaryOperator",
            QueryToken::UnaryOperator { .. } => "UnaryOperator",
            QueryToken::PropertyAccess { .. } => "PropertyAccess",
            QueryToken::FunctionCall { .. } => "FunctionCall",
            QueryToken::Any { .. } => "Any",
            QueryToken::All { .. } => "All",
            QueryToken::Star { .. } => "Star",
            QueryToken::Parameter { .. } => "Parameter",
            QueryToken::Cast { .. } => "Cast",
            QueryToken::Segment { .. } => "Segment",
        }
    }
}
