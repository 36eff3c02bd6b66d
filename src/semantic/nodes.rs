use crate::{
    ast::{BinaryOperatorKind, OrderDirection, UnaryOperatorKind},
    edm::TypeReference,
    functions::Operation,
    value::Value,
};

/// A lambda parameter or the implicit `$it`, with the type it ranges over.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeVariable {
    pub name: String,
    pub type_ref: Option<TypeReference>,
}

/// Bound, typed expression node.
///
/// Mirrors the shape of the token tree, but every node answers
/// [`QueryNode::type_ref`]. `None` means the type is not resolvable yet (for
/// example a dynamic property of an open type, or `null`), not that binding failed.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Literal value
    Constant {
        value: Value,
        raw_text: String,
        type_ref: Option<TypeReference>,
    },

    BinaryOperator {
        op: BinaryOperatorKind,
        left: Box<QueryNode>,
        right: Box<QueryNode>,
        type_ref: Option<TypeReference>,
    },

    UnaryOperator {
        op: UnaryOperatorKind,
        operand: Box<QueryNode>,
        type_ref: Option<TypeReference>,
    },

    /// Reference to `$it` or a lambda parameter
    RangeVariable {
        name: String,
        type_ref: Option<TypeReference>,
    },

    /// Declared or dynamic property of `source`
    PropertyAccess {
        source: Box<QueryNode>,
        name: String,
        navigation: bool,
        type_ref: Option<TypeReference>,
    },

    /// Resolved canonical function; `operation` is `None` for `isof` / `cast`
    FunctionCall {
        name: String,
        args: Vec<QueryNode>,
        operation: Option<Operation>,
        type_ref: Option<TypeReference>,
    },

    /// Always `Edm.Boolean`
    Any {
        source: Box<QueryNode>,
        parameter: Option<RangeVariable>,
        body: Box<QueryNode>,
        type_ref: TypeReference,
    },

    /// Always `Edm.Boolean`
    All {
        source: Box<QueryNode>,
        parameter: Option<RangeVariable>,
        body: Box<QueryNode>,
        type_ref: TypeReference,
    },

    /// Type segment narrowing `source` to a derived type
    Cast {
        source: Box<QueryNode>,
        type_ref: TypeReference,
    },

    /// `*` in `$select` / `$expand`
    Wildcard { source: Option<Box<QueryNode>> },
}

impl QueryNode {
    pub fn type_ref(&self) -> Option<&TypeReference> {
        match self {
            QueryNode::Constant { type_ref, .. }
            | QueryNode::BinaryOperator { type_ref, .. }
            | QueryNode::UnaryOperator { type_ref, .. }
            | QueryNode::RangeVariable { type_ref, .. }
            | QueryNode::PropertyAccess { type_ref, .. }
            | QueryNode::FunctionCall { type_ref, .. } => type_ref.as_ref(),
            QueryNode::Any { type_ref, .. }
            | QueryNode::All { type_ref, .. }
            | QueryNode::Cast { type_ref, .. } => Some(type_ref),
            QueryNode::Wildcard { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            QueryNode::Constant { .. } => "Constant",
            QueryNode::BinaryOperator { .. } => "BinaryOperator",
            QueryNode::UnaryOperator { .. } => "UnaryOperator",
            QueryNode::RangeVariable { .. } => "RangeVariable",
            QueryNode::PropertyAccess { .. } => "PropertyAccess",
            QueryNode::FunctionCall { .. } => "FunctionCall",
            QueryNode::Any { .. } => "Any",
            QueryNode::All { .. } => "All",
            QueryNode::Cast { .. } => "Cast",
            QueryNode::Wildcard { .. } => "Wildcard",
        }
    }
}

/// Bound `$filter`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub expression: QueryNode,
    /// The implicit `$it` the expression ranges over
    pub range_variable: RangeVariable,
}

/// One bound `$orderby` item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub expression: QueryNode,
    pub direction: OrderDirection,
}

/// Bound `$select` or `$expand`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectExpandClause {
    /// A top-level `*` was present
    pub wildcard: bool,
    /// Bound property paths, in input order
    pub paths: Vec<QueryNode>,
}
