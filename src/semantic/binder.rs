use tracing::{debug, trace};

use crate::{
    ast::{
        BinaryOperatorKind, ExpandToken, LiteralToken, OrderByToken, QueryToken, SelectToken,
        UnaryOperatorKind,
    },
    edm::{EdmModel, TypeDefinition, TypeReference},
    error::{QueryError, Result},
    functions::FunctionCatalog,
    settings::DEFAULT_MAX_TREE_DEPTH,
    value::Value,
};

use super::nodes::{
    FilterClause, OrderByClause, QueryNode, RangeVariable, SelectExpandClause,
};

const IMPLICIT_RANGE_VARIABLE: &str = "$it";

/// Binds query tokens for one entity type.
///
/// # Examples
///
/// ```
/// use odata_query::edm::{Model, StructuredType, TypeReference};
/// use odata_query::parser::Parser;
/// use odata_query::semantic::Binder;
///
/// let mut model = Model::new();
/// model.add_type(
///     StructuredType::entity("Shop", "Product")
///         .with_property("Name", TypeReference::string(true)),
/// );
///
/// let token = Parser::new("Name eq 'Foo'").and_then(Parser::parse_filter).unwrap();
/// let mut binder = Binder::new(&model, TypeReference::structured("Shop.Product", false));
/// let filter = binder.bind_filter(&token).unwrap();
/// assert!(filter.expression.type_ref().unwrap().is_boolean());
/// ```
pub struct Binder<'a> {
    model: &'a dyn EdmModel,
    functions: &'a FunctionCatalog,
    implicit: RangeVariable,
    /// Lambda parameters in scope, innermost last
    scopes: Vec<RangeVariable>,
    max_depth: usize,
    depth: usize,
}

impl<'a> Binder<'a> {
    /// Creates a binder whose `$it` has type `it_type`, using the built-in functions.
    pub fn new(model: &'a dyn EdmModel, it_type: TypeReference) -> Self {
        Binder {
            model,
            functions: FunctionCatalog::builtin(),
            implicit: RangeVariable {
                name: IMPLICIT_RANGE_VARIABLE.to_string(),
                type_ref: Some(it_type),
            },
            scopes: Vec::new(),
            max_depth: DEFAULT_MAX_TREE_DEPTH,
            depth: 0,
        }
    }

    pub fn with_functions(mut self, functions: &'a FunctionCatalog) -> Self {
        self.functions = functions;
        self
    }

    /// Maximum nesting of a token tree this binder accepts.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Binds a `$filter` expression; a resolved result must be `Edm.Boolean`.
    pub fn bind_filter(&mut self, token: &QueryToken) -> Result<FilterClause> {
        debug!(it = ?self.implicit.type_ref, "binding $filter");
        let expression = self.bind(token)?;
        if let Some(t) = expression.type_ref()
            && !t.is_boolean()
        {
            return Err(QueryError::type_binding(
                format!(
                    "The $filter expression must be of type 'Edm.Boolean', found '{}'",
                    t
                ),
                "$filter",
            ));
        }
        Ok(FilterClause {
            expression,
            range_variable: self.implicit.clone(),
        })
    }

    /// Binds `$orderby` items; each resolved expression must be a primitive value.
    pub fn bind_order_by(&mut self, items: &[OrderByToken]) -> Result<Vec<OrderByClause>> {
        debug!(count = items.len(), "binding $orderby");
        items
            .iter()
            .map(|item| {
                let expression = self.bind(&item.expression)?;
                if let Some(t) = expression.type_ref()
                    && !t.is_primitive()
                {
                    return Err(QueryError::type_binding(
                        format!(
                            "The $orderby expression must be a primitive value, found '{}'",
                            t
                        ),
                        "$orderby",
                    ));
                }
                Ok(OrderByClause {
                    expression,
                    direction: item.direction,
                })
            })
            .collect()
    }

    pub fn bind_select(&mut self, token: &SelectToken) -> Result<SelectExpandClause> {
        debug!(count = token.properties.len(), "binding $select");
        self.bind_select_items(&token.properties, false)
    }

    /// Binds `$expand`; every path must end in a navigation property.
    pub fn bind_expand(&mut self, token: &ExpandToken) -> Result<SelectExpandClause> {
        debug!(count = token.properties.len(), "binding $expand");
        self.bind_select_items(&token.properties, true)
    }

    /// Binds any expression token.
    pub fn bind(&mut self, token: &QueryToken) -> Result<QueryNode> {
        self.descend(|b| b.bind_token(token))
    }

    /// Runs `walk` one level deeper in the token tree.
    ///
    /// The depth is restored on every exit path, including errors.
    fn descend<T>(&mut self, walk: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.max_depth {
            return Err(QueryError::RecursionLimit {
                limit: self.max_depth,
                position: None,
            });
        }
        self.depth += 1;
        let result = walk(self);
        self.depth -= 1;
        result
    }

    fn bind_token(&mut self, token: &QueryToken) -> Result<QueryNode> {
        match token {
            QueryToken::Literal(literal) => Ok(constant(literal)),
            QueryToken::BinaryOperator { op, left, right } => {
                self.bind_binary_operator(*op, left, right)
            }
            QueryToken::UnaryOperator { op, operand } => self.bind_unary_operator(*op, operand),
            QueryToken::PropertyAccess { name, instance } => {
                self.bind_property_access(name, instance.as_deref())
            }
            QueryToken::FunctionCall { name, args } => self.bind_function_call(name, args),
            QueryToken::Any {
                source,
                parameter,
                body,
            } => self.bind_lambda(true, source.as_deref(), parameter.as_deref(), body),
            QueryToken::All {
                source,
                parameter,
                body,
            } => self.bind_lambda(false, source.as_deref(), parameter.as_deref(), body),
            QueryToken::Parameter { name } => self.bind_parameter(name),
            QueryToken::Cast {
                type_name,
                instance,
            } => {
                let source = match instance {
                    Some(instance) => self.bind(instance)?,
                    None => self.implicit_node(),
                };
                self.bind_cast(source, type_name)
            }
            QueryToken::Star { .. } => Err(QueryError::resolution(
                "'*' is only valid in $select and $expand",
                "*",
            )),
            QueryToken::Segment { name, .. } => Err(QueryError::resolution(
                "A resource path segment cannot appear in an expression",
                name.as_str(),
            )),
        }
    }

    fn implicit_node(&self) -> QueryNode {
        range_variable_node(&self.implicit)
    }

    fn lookup_range_variable(&self, name: &str) -> Option<&RangeVariable> {
        self.scopes.iter().rev().find(|variable| variable.name == name)
    }

    /// Binds `body` with `variable` in scope; the scope is popped on every exit path.
    fn with_range_variable<T>(
        &mut self,
        variable: RangeVariable,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        trace!(parameter = %variable.name, "entering lambda scope");
        self.scopes.push(variable);
        let result = body(self);
        self.scopes.pop();
        result
    }

    fn bind_binary_operator(
        &mut self,
        op: BinaryOperatorKind,
        left: &QueryToken,
        right: &QueryToken,
    ) -> Result<QueryNode> {
        let left = self.bind(left)?;
        let right = self.bind(right)?;

        let type_ref = match (left.type_ref(), right.type_ref()) {
            (Some(l), Some(r)) => Some(binary_result_type(op, l, r)?),
            _ => None,
        };

        Ok(QueryNode::BinaryOperator {
            op,
            left: Box::new(left),
            right: Box::new(right),
            type_ref,
        })
    }

    fn bind_unary_operator(
        &mut self,
        op: UnaryOperatorKind,
        operand: &QueryToken,
    ) -> Result<QueryNode> {
        let operand = self.bind(operand)?;
        let type_ref = operand.type_ref().cloned();

        if let Some(t) = &type_ref {
            let valid = match op {
                UnaryOperatorKind::Not => t.is_boolean(),
                UnaryOperatorKind::Negate => t.as_primitive().is_some_and(|k| k.is_numeric()),
            };
            if !valid {
                return Err(QueryError::type_binding(
                    format!(
                        "The operator '{}' cannot be applied to an operand of type '{}'",
                        op.keyword(),
                        t
                    ),
                    op.keyword(),
                ));
            }
        }

        Ok(QueryNode::UnaryOperator {
            op,
            operand: Box::new(operand),
            type_ref,
        })
    }

    fn bind_parameter(&self, name: &str) -> Result<QueryNode> {
        if name == IMPLICIT_RANGE_VARIABLE {
            return Ok(self.implicit_node());
        }
        self.lookup_range_variable(name)
            .map(range_variable_node)
            .ok_or_else(|| {
                QueryError::resolution(format!("Unknown range variable '{}'", name), name)
            })
    }

    fn bind_property_access(
        &mut self,
        name: &str,
        instance: Option<&QueryToken>,
    ) -> Result<QueryNode> {
        let source = match instance {
            Some(instance) => self.bind(instance)?,
            None => {
                if let Some(variable) = self.lookup_range_variable(name) {
                    return Ok(range_variable_node(variable));
                }
                self.implicit_node()
            }
        };
        self.bind_property(source, name, false)
    }

    /// Resolves `name` on the type of `source`.
    ///
    /// With `through_collections`, a collection source is looked through to its
    /// element type (`$select=Orders/Amount`).
    fn bind_property(
        &self,
        source: QueryNode,
        name: &str,
        through_collections: bool,
    ) -> Result<QueryNode> {
        let Some(mut lookup_type) = source.type_ref().cloned() else {
            trace!(property = name, "property access on an unresolved source");
            return Ok(property_node(source, name, false, None));
        };
        if through_collections && let Some(element) = lookup_type.element_type() {
            lookup_type = element.clone();
        }

        match &lookup_type.definition {
            TypeDefinition::Structured(type_name) => {
                let ty = self.model.find_structured_type(type_name).ok_or_else(|| {
                    QueryError::resolution(
                        format!("Type '{}' is not defined in the model", type_name),
                        type_name.as_str(),
                    )
                })?;
                match self.model.find_property(ty, name) {
                    Some(property) => Ok(property_node(
                        source,
                        name,
                        property.navigation,
                        Some(property.type_ref.clone()),
                    )),
                    None if self.model.is_open(ty) => {
                        trace!(property = name, type_name = %type_name, "open type property");
                        Ok(property_node(source, name, false, None))
                    }
                    None => Err(QueryError::resolution(
                        format!(
                            "Could not find a property named '{}' on type '{}'",
                            name, type_name
                        ),
                        name,
                    )),
                }
            }
            TypeDefinition::Primitive(kind) => Err(QueryError::resolution(
                format!(
                    "Property '{}' cannot be accessed on a value of primitive type '{}'",
                    name, kind
                ),
                name,
            )),
            TypeDefinition::Collection(_) => Err(QueryError::resolution(
                format!(
                    "Property '{}' cannot be accessed on a value of type '{}'; use any or all",
                    name, lookup_type
                ),
                name,
            )),
        }
    }

    fn bind_function_call(&mut self, name: &str, args: &[QueryToken]) -> Result<QueryNode> {
        if name == "isof" || name == "cast" {
            return self.bind_type_function(name, args);
        }

        let args = args
            .iter()
            .map(|arg| self.bind(arg))
            .collect::<Result<Vec<_>>>()?;
        let argument_types: Vec<Option<TypeReference>> =
            args.iter().map(|arg| arg.type_ref().cloned()).collect();

        let signature = self.functions.resolve(name, &argument_types)?;
        let nullable = argument_types
            .iter()
            .any(|t| t.as_ref().is_none_or(|t| t.nullable));

        Ok(QueryNode::FunctionCall {
            name: name.to_string(),
            args,
            operation: Some(signature.operation.clone()),
            type_ref: Some(signature.return_type.clone().with_nullable(nullable)),
        })
    }

    /// `isof(T)`, `isof(x, T)`, `cast(T)` and `cast(x, T)` where `T` is a
    /// quoted type name; without `x` the target is `$it`.
    fn bind_type_function(&mut self, name: &str, args: &[QueryToken]) -> Result<QueryNode> {
        let (source, type_argument) = match args {
            [type_argument] => (None, type_argument),
            [source, type_argument] => (Some(source), type_argument),
            _ => {
                return Err(QueryError::resolution(
                    format!(
                        "Function '{}' takes one or two arguments, found {}",
                        name,
                        args.len()
                    ),
                    name,
                ));
            }
        };

        let not_a_type_name = || {
            QueryError::resolution(
                format!("The last argument of '{}' must be a quoted type name", name),
                name,
            )
        };
        let QueryToken::Literal(type_literal) = type_argument else {
            return Err(not_a_type_name());
        };
        let Value::String(type_name) = &type_literal.value else {
            return Err(not_a_type_name());
        };
        let target = self.resolve_type_name(type_name)?;

        let source = match source {
            Some(source) => self.bind(source)?,
            None => self.implicit_node(),
        };

        let type_ref = if name == "isof" {
            TypeReference::boolean(false)
        } else {
            target
        };
        Ok(QueryNode::FunctionCall {
            name: name.to_string(),
            args: vec![source, constant(type_literal)],
            operation: None,
            type_ref: Some(type_ref),
        })
    }

    fn resolve_type_name(&self, type_name: &str) -> Result<TypeReference> {
        let unknown = || QueryError::resolution(format!("Unknown type '{}'", type_name), type_name);
        let type_ref = TypeReference::parse(type_name, true).ok_or_else(unknown)?;

        let mut innermost = &type_ref;
        while let Some(element) = innermost.element_type() {
            innermost = element;
        }
        if let Some(structured) = innermost.as_structured()
            && self.model.find_structured_type(structured).is_none()
        {
            return Err(unknown());
        }
        Ok(type_ref)
    }

    /// A qualified path segment narrows an entity (or collection of entities)
    /// to a derived type.
    fn bind_cast(&self, source: QueryNode, type_name: &str) -> Result<QueryNode> {
        if self.model.find_structured_type(type_name).is_none() {
            return Err(QueryError::resolution(
                format!("Unknown type segment '{}'", type_name),
                type_name,
            ));
        }
        let target = |nullable| TypeReference::structured(type_name, nullable);

        let type_ref = match source.type_ref() {
            None => target(true),
            Some(source_type) => {
                let (base, collection) = match source_type.element_type() {
                    Some(element) => (element, true),
                    None => (source_type, false),
                };
                let Some(base_name) = base.as_structured() else {
                    return Err(QueryError::type_binding(
                        format!(
                            "Cannot cast a value of type '{}' to '{}'",
                            source_type, type_name
                        ),
                        type_name,
                    ));
                };
                if !self.model.derives_from(type_name, base_name) {
                    return Err(QueryError::type_binding(
                        format!("Type '{}' does not derive from '{}'", type_name, base_name),
                        type_name,
                    ));
                }
                if collection {
                    TypeReference::collection(target(base.nullable))
                } else {
                    target(source_type.nullable)
                }
            }
        };

        Ok(QueryNode::Cast {
            source: Box::new(source),
            type_ref,
        })
    }

    fn bind_lambda(
        &mut self,
        is_any: bool,
        source: Option<&QueryToken>,
        parameter: Option<&str>,
        body: &QueryToken,
    ) -> Result<QueryNode> {
        let operator = if is_any { "any" } else { "all" };
        let source = match source {
            Some(source) => self.bind(source)?,
            None => self.implicit_node(),
        };

        let element_type = match source.type_ref() {
            Some(t) => match t.element_type() {
                Some(element) => Some(element.clone()),
                None => {
                    return Err(QueryError::type_binding(
                        format!(
                            "The source of '{}' must be a collection, found '{}'",
                            operator, t
                        ),
                        operator,
                    ));
                }
            },
            None => None,
        };

        let parameter = parameter.map(|name| RangeVariable {
            name: name.to_string(),
            type_ref: element_type,
        });
        let body = match &parameter {
            Some(variable) => self.with_range_variable(variable.clone(), |b| b.bind(body))?,
            None => self.bind(body)?,
        };

        if let Some(t) = body.type_ref()
            && !t.is_boolean()
        {
            return Err(QueryError::type_binding(
                format!(
                    "The body of '{}' must be of type 'Edm.Boolean', found '{}'",
                    operator, t
                ),
                operator,
            ));
        }

        let source = Box::new(source);
        let body = Box::new(body);
        let type_ref = TypeReference::boolean(false);
        Ok(if is_any {
            QueryNode::Any {
                source,
                parameter,
                body,
                type_ref,
            }
        } else {
            QueryNode::All {
                source,
                parameter,
                body,
                type_ref,
            }
        })
    }

    fn bind_select_items(
        &mut self,
        items: &[QueryToken],
        expand: bool,
    ) -> Result<SelectExpandClause> {
        let mut clause = SelectExpandClause::default();
        for item in items {
            if let QueryToken::Star { instance: None } = item {
                clause.wildcard = true;
                continue;
            }
            let path = self.bind_path(item)?;
            if expand && !matches!(path, QueryNode::PropertyAccess { navigation: true, .. }) {
                return Err(QueryError::resolution(
                    format!(
                        "Only navigation properties can be expanded, found {}",
                        describe_path(&path)
                    ),
                    path_name(&path),
                ));
            }
            clause.paths.push(path);
        }
        Ok(clause)
    }

    /// Binds a `$select` / `$expand` path: property names, type segments and a trailing `*`.
    fn bind_path(&mut self, token: &QueryToken) -> Result<QueryNode> {
        self.descend(|b| b.bind_path_token(token))
    }

    fn bind_path_token(&mut self, token: &QueryToken) -> Result<QueryNode> {
        match token {
            QueryToken::PropertyAccess { name, instance } => {
                let source = match instance {
                    Some(instance) => self.bind_path(instance)?,
                    None => self.implicit_node(),
                };
                self.bind_property(source, name, true)
            }
            QueryToken::Cast {
                type_name,
                instance,
            } => {
                let source = match instance {
                    Some(instance) => self.bind_path(instance)?,
                    None => self.implicit_node(),
                };
                self.bind_cast(source, type_name)
            }
            QueryToken::Star {
                instance: Some(instance),
            } => Ok(QueryNode::Wildcard {
                source: Some(Box::new(self.bind_path(instance)?)),
            }),
            other => Err(QueryError::resolution(
                format!(
                    "A {} token is not a valid $select or $expand item",
                    other.kind_name()
                ),
                other.kind_name(),
            )),
        }
    }
}

/// Result type of a binary operator over two resolved operands.
fn binary_result_type(
    op: BinaryOperatorKind,
    left: &TypeReference,
    right: &TypeReference,
) -> Result<TypeReference> {
    let operands_match = if op.is_logical() {
        left.is_boolean() && right.is_boolean()
    } else {
        left.is_primitive() && right.is_primitive() && left.is_equivalent(right)
    };
    if !operands_match {
        return Err(QueryError::type_binding(
            format!(
                "The operator '{}' is not defined for operands of type '{}' and '{}'",
                op.keyword(),
                left,
                right
            ),
            op.keyword(),
        ));
    }

    let nullable = left.nullable || right.nullable;
    if op.is_logical() || op.is_comparison() {
        Ok(TypeReference::boolean(nullable))
    } else {
        Ok(left.clone().with_nullable(nullable))
    }
}

fn constant(literal: &LiteralToken) -> QueryNode {
    QueryNode::Constant {
        value: literal.value.clone(),
        raw_text: literal.raw_text.clone(),
        type_ref: literal.value.type_ref(),
    }
}

fn range_variable_node(variable: &RangeVariable) -> QueryNode {
    QueryNode::RangeVariable {
        name: variable.name.clone(),
        type_ref: variable.type_ref.clone(),
    }
}

fn property_node(
    source: QueryNode,
    name: &str,
    navigation: bool,
    type_ref: Option<TypeReference>,
) -> QueryNode {
    QueryNode::PropertyAccess {
        source: Box::new(source),
        name: name.to_string(),
        navigation,
        type_ref,
    }
}

fn path_name(node: &QueryNode) -> String {
    match node {
        QueryNode::PropertyAccess { name, .. } => name.clone(),
        QueryNode::Cast { type_ref, .. } => type_ref.to_string(),
        other => other.kind_name().to_string(),
    }
}

fn describe_path(node: &QueryNode) -> String {
    match node {
        QueryNode::PropertyAccess { name, .. } => format!("'{}'", name),
        QueryNode::Cast { type_ref, .. } => format!("type segment '{}'", type_ref),
        other => other.kind_name().to_string(),
    }
}
