use std::collections::HashSet;

use tracing::{debug, trace};

use crate::{
    ast::{
        BinaryOperatorKind, ExpandToken, LiteralToken, NamedValue, OrderByToken, OrderDirection,
        QueryToken, SelectToken, TokenKind, UnaryOperatorKind,
    },
    error::{QueryError, Result},
    lexer::Lexer,
    literal::resolve_literal,
    settings::ParserSettings,
    value::Value,
};

/// Recursive-descent parser for OData query expressions.
///
/// A parser owns its lexer cursor and recursion counter, so it is single-use:
/// every entry point consumes `self`. Build a fresh parser per parse call.
///
/// # Examples
///
/// ```
/// use odata_query::parser::Parser;
///
/// let filter = Parser::new("Price gt 100 and Name eq 'Foo'")
///     .and_then(Parser::parse_filter)
///     .unwrap();
/// assert_eq!(filter.kind_name(), "BinaryOperator");
/// ```
pub struct Parser {
    lexer: Lexer,
    source: String,
    max_depth: usize,
    depth: usize,
}

impl Parser {
    pub fn new(text: &str) -> Result<Self> {
        Self::with_settings(text, ParserSettings::default())
    }

    pub fn with_settings(text: &str, settings: ParserSettings) -> Result<Self> {
        Ok(Parser {
            lexer: Lexer::new(text)?,
            source: text.to_string(),
            max_depth: settings.max_depth,
            depth: 0,
        })
    }

    /// Parses a `$filter` value: one expression spanning the whole input.
    pub fn parse_filter(mut self) -> Result<QueryToken> {
        debug!(filter = %self.source, "parsing $filter");
        let expression = self.parse_expression()?;
        self.expect_end()?;
        Ok(expression)
    }

    /// Parses a `$orderby` value: `expr [asc|desc], ...`, ascending by default.
    pub fn parse_order_by(mut self) -> Result<Vec<OrderByToken>> {
        debug!(orderby = %self.source, "parsing $orderby");
        let mut items = Vec::new();
        loop {
            let expression = self.parse_expression()?;
            let direction = if self.lexer.current().identifier_is("asc") {
                self.lexer.next_token()?;
                OrderDirection::Ascending
            } else if self.lexer.current().identifier_is("desc") {
                self.lexer.next_token()?;
                OrderDirection::Descending
            } else {
                OrderDirection::Ascending
            };
            items.push(OrderByToken {
                expression,
                direction,
            });

            if self.lexer.current().kind != TokenKind::Comma {
                break;
            }
            self.lexer.next_token()?;
        }
        self.expect_end()?;
        Ok(items)
    }

    /// Parses a `$select` value: comma-separated property paths or `*`.
    pub fn parse_select(mut self) -> Result<SelectToken> {
        debug!(select = %self.source, "parsing $select");
        let properties = self.parse_comma_separated()?;
        self.expect_end()?;
        Ok(SelectToken { properties })
    }

    /// Parses a `$expand` value: comma-separated navigation paths.
    pub fn parse_expand(mut self) -> Result<ExpandToken> {
        debug!(expand = %self.source, "parsing $expand");
        let properties = self.parse_comma_separated()?;
        self.expect_end()?;
        Ok(ExpandToken { properties })
    }

    /// Parses a parenthesised key predicate such as `(1)` or `(OrderId=1,ProductId=2)`.
    pub fn parse_key_values(mut self) -> Result<Vec<NamedValue>> {
        debug!(key = %self.source, "parsing key values");
        let values = self.parse_key_predicate()?;
        self.expect_end()?;
        Ok(values)
    }

    /// Parses a resource path such as `Customers(1)/Orders` into a `Segment` chain.
    pub fn parse_path(mut self) -> Result<QueryToken> {
        debug!(path = %self.source, "parsing resource path");
        if self.lexer.current().kind == TokenKind::Slash {
            self.lexer.next_token()?;
        }

        let mut parent: Option<QueryToken> = None;
        loop {
            self.lexer.validate_token(TokenKind::Identifier)?;
            let name = self.lexer.current().text.clone();
            self.lexer.next_token()?;

            let key = if self.lexer.current().kind == TokenKind::OpenParen {
                self.parse_key_predicate()?
            } else {
                Vec::new()
            };
            parent = Some(QueryToken::Segment {
                name,
                key,
                parent: parent.map(Box::new),
            });

            if self.lexer.current().kind != TokenKind::Slash {
                break;
            }
            self.enter()?;
            self.lexer.next_token()?;
        }
        self.expect_end()?;

        parent.ok_or_else(|| QueryError::syntax("Empty resource path", "", 0))
    }

    /// Parses one expression; the entry point for every nested sub-expression.
    pub fn parse_expression(&mut self) -> Result<QueryToken> {
        self.recurse(|p| p.parse_logical_or())
    }

    /// Runs one grammar production one level deeper.
    ///
    /// Levels entered inside the production (binary chains, member paths)
    /// are released with it. The depth is restored on every exit path,
    /// including errors.
    fn recurse<T>(&mut self, production: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let depth = self.depth;
        self.enter()?;
        let result = production(self);
        self.depth = depth;
        result
    }

    /// Takes one more level of nesting, failing at the limit.
    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(QueryError::RecursionLimit {
                limit: self.max_depth,
                position: Some(self.lexer.current().position),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn expect_end(&self) -> Result<()> {
        self.lexer.validate_token(TokenKind::End)
    }

    fn parse_comma_separated(&mut self) -> Result<Vec<QueryToken>> {
        let mut items = vec![self.parse_expression()?];
        while self.lexer.current().kind == TokenKind::Comma {
            self.lexer.next_token()?;
            items.push(self.parse_expression()?);
        }
        Ok(items)
    }

    fn parse_logical_or(&mut self) -> Result<QueryToken> {
        self.recurse(|p| {
            let mut left = p.parse_logical_and()?;
            while p.lexer.current().identifier_is("or") {
                p.enter()?;
                p.lexer.next_token()?;
                let right = p.parse_logical_and()?;
                left = QueryToken::binary(BinaryOperatorKind::Or, left, right);
            }
            Ok(left)
        })
    }

    fn parse_logical_and(&mut self) -> Result<QueryToken> {
        self.recurse(|p| {
            let mut left = p.parse_comparison()?;
            while p.lexer.current().identifier_is("and") {
                p.enter()?;
                p.lexer.next_token()?;
                let right = p.parse_comparison()?;
                left = QueryToken::binary(BinaryOperatorKind::And, left, right);
            }
            Ok(left)
        })
    }

    fn parse_comparison(&mut self) -> Result<QueryToken> {
        self.recurse(|p| {
            let mut left = p.parse_additive()?;
            while p.lexer.is_comparison_operator() {
                let Some(op) = BinaryOperatorKind::from_comparison_keyword(&p.lexer.current().text)
                else {
                    break;
                };
                p.enter()?;
                p.lexer.next_token()?;
                let right = p.parse_additive()?;
                left = QueryToken::binary(op, left, right);
            }
            Ok(left)
        })
    }

    fn parse_additive(&mut self) -> Result<QueryToken> {
        self.recurse(|p| {
            let mut left = p.parse_multiplicative()?;
            loop {
                let op = match p.lexer.current() {
                    t if t.identifier_is("add") => BinaryOperatorKind::Add,
                    t if t.identifier_is("sub") => BinaryOperatorKind::Subtract,
                    _ => break,
                };
                p.enter()?;
                p.lexer.next_token()?;
                let right = p.parse_multiplicative()?;
                left = QueryToken::binary(op, left, right);
            }
            Ok(left)
        })
    }

    fn parse_multiplicative(&mut self) -> Result<QueryToken> {
        self.recurse(|p| {
            let mut left = p.parse_unary()?;
            loop {
                let op = match p.lexer.current() {
                    t if t.identifier_is("mul") => BinaryOperatorKind::Multiply,
                    t if t.identifier_is("div") => BinaryOperatorKind::Divide,
                    t if t.identifier_is("mod") => BinaryOperatorKind::Modulo,
                    _ => break,
                };
                p.enter()?;
                p.lexer.next_token()?;
                let right = p.parse_unary()?;
                left = QueryToken::binary(op, left, right);
            }
            Ok(left)
        })
    }

    fn parse_unary(&mut self) -> Result<QueryToken> {
        self.recurse(|p| {
            if p.lexer.current().kind == TokenKind::Minus {
                let minus_position = p.lexer.current().position;
                p.lexer.next_token()?;

                // `-5` stays a literal so its text round-trips exactly
                if p.lexer.current().kind.is_numeric_literal() {
                    let literal = p.lexer.current_mut();
                    literal.text = format!("-{}", literal.text);
                    literal.position = minus_position;
                    return p.parse_primary();
                }

                let operand = p.parse_unary()?;
                return Ok(QueryToken::unary(UnaryOperatorKind::Negate, operand));
            }

            if p.lexer.current().identifier_is("not") {
                p.lexer.next_token()?;
                let operand = p.parse_unary()?;
                return Ok(QueryToken::unary(UnaryOperatorKind::Not, operand));
            }

            p.parse_primary()
        })
    }

    fn parse_primary(&mut self) -> Result<QueryToken> {
        self.recurse(|p| {
            let mut expression = p.parse_primary_start()?;
            while p.lexer.current().kind == TokenKind::Slash {
                p.enter()?;
                p.lexer.next_token()?;
                expression = p.parse_member_access(expression)?;
            }
            Ok(expression)
        })
    }

    fn parse_primary_start(&mut self) -> Result<QueryToken> {
        let kind = self.lexer.current().kind;
        match kind {
            k if k.is_literal() => self.parse_literal(),
            TokenKind::OpenParen => self.parse_paren_expression(),
            TokenKind::Star => {
                self.lexer.next_token()?;
                Ok(QueryToken::Star { instance: None })
            }
            TokenKind::Identifier => self.parse_identifier(None),
            _ => Err(QueryError::syntax(
                format!("Expression expected, found {}", self.lexer.describe_current()),
                self.lexer.current().text.clone(),
                self.lexer.current().position,
            )),
        }
    }

    fn parse_member_access(&mut self, instance: QueryToken) -> Result<QueryToken> {
        match self.lexer.current().kind {
            TokenKind::Star => {
                self.lexer.next_token()?;
                Ok(QueryToken::Star {
                    instance: Some(Box::new(instance)),
                })
            }
            TokenKind::Identifier => self.parse_identifier(Some(instance)),
            _ => Err(QueryError::syntax(
                format!(
                    "Identifier expected after '/', found {}",
                    self.lexer.describe_current()
                ),
                self.lexer.current().text.clone(),
                self.lexer.current().position,
            )),
        }
    }

    fn parse_paren_expression(&mut self) -> Result<QueryToken> {
        self.lexer.validate_token(TokenKind::OpenParen)?;
        self.lexer.next_token()?;
        let expression = self.parse_expression()?;
        self.lexer.validate_token(TokenKind::CloseParen)?;
        self.lexer.next_token()?;
        Ok(expression)
    }

    fn parse_literal(&mut self) -> Result<QueryToken> {
        let literal = resolve_literal(self.lexer.current())?;
        self.lexer.next_token()?;
        Ok(QueryToken::Literal(literal))
    }

    fn parse_identifier(&mut self, instance: Option<QueryToken>) -> Result<QueryToken> {
        let token = self.lexer.current().clone();

        if self.lexer.peek_next_token()?.kind == TokenKind::OpenParen {
            if token.text == "any" || token.text == "all" {
                return self.parse_lambda(instance);
            }
            if instance.is_some() {
                return Err(QueryError::syntax(
                    format!("Function '{}' cannot follow a path segment", token.text),
                    token.text,
                    token.position,
                ));
            }
            return self.parse_function_call();
        }

        self.lexer.next_token()?;

        if token.text == "$it" {
            if instance.is_some() {
                return Err(QueryError::syntax(
                    "'$it' must start a path",
                    token.text,
                    token.position,
                ));
            }
            return Ok(QueryToken::Parameter { name: token.text });
        }

        // Qualified names in a path are type segments
        if token.text.contains('.') {
            return Ok(QueryToken::Cast {
                type_name: token.text,
                instance: instance.map(Box::new),
            });
        }

        Ok(QueryToken::PropertyAccess {
            name: token.text,
            instance: instance.map(Box::new),
        })
    }

    fn parse_function_call(&mut self) -> Result<QueryToken> {
        let name = self.lexer.current().text.clone();
        self.lexer.next_token()?;
        self.lexer.validate_token(TokenKind::OpenParen)?;
        self.lexer.next_token()?;

        let mut args = Vec::new();
        if self.lexer.current().kind == TokenKind::CloseParen {
            self.lexer.next_token()?;
            return Ok(QueryToken::FunctionCall { name, args });
        }

        loop {
            args.push(self.parse_expression()?);
            match self.lexer.current().kind {
                TokenKind::Comma => {
                    self.lexer.next_token()?;
                }
                TokenKind::CloseParen => {
                    self.lexer.next_token()?;
                    break;
                }
                _ => {
                    return Err(QueryError::syntax(
                        format!(
                            "')' or ',' expected in arguments of '{}', found {}",
                            name,
                            self.lexer.describe_current()
                        ),
                        self.lexer.current().text.clone(),
                        self.lexer.current().position,
                    ));
                }
            }
        }

        trace!(function = %name, arity = args.len(), "parsed function call");
        Ok(QueryToken::FunctionCall { name, args })
    }

    /// Parses `any(x: body)`, `all(x: body)` or the empty form `any()`.
    fn parse_lambda(&mut self, source: Option<QueryToken>) -> Result<QueryToken> {
        let is_any = self.lexer.current().text == "any";
        self.lexer.next_token()?;
        self.lexer.validate_token(TokenKind::OpenParen)?;
        self.lexer.next_token()?;

        let (parameter, body) = if self.lexer.current().kind == TokenKind::CloseParen {
            self.lexer.next_token()?;
            (None, QueryToken::literal(Value::Boolean(true), "true"))
        } else {
            self.lexer.validate_token(TokenKind::Identifier)?;
            let parameter = self.lexer.current().text.clone();
            self.lexer.next_token()?;
            self.lexer.validate_token(TokenKind::Colon)?;
            self.lexer.next_token()?;
            let body = self.parse_expression()?;
            self.lexer.validate_token(TokenKind::CloseParen)?;
            self.lexer.next_token()?;
            (Some(parameter), body)
        };

        let source = source.map(Box::new);
        let body = Box::new(body);
        Ok(if is_any {
            QueryToken::Any {
                source,
                parameter,
                body,
            }
        } else {
            QueryToken::All {
                source,
                parameter,
                body,
            }
        })
    }

    fn parse_key_predicate(&mut self) -> Result<Vec<NamedValue>> {
        self.lexer.validate_token(TokenKind::OpenParen)?;
        let open_position = self.lexer.current().position;
        self.lexer.next_token()?;

        if self.lexer.current().kind == TokenKind::CloseParen {
            return Err(QueryError::syntax(
                "Empty key predicate",
                "()",
                open_position,
            ));
        }

        let mut values = Vec::new();
        loop {
            let name = if self.lexer.current().kind == TokenKind::Identifier
                && self.lexer.peek_next_token()?.kind == TokenKind::Equal
            {
                let name = self.lexer.current().text.clone();
                self.lexer.next_token()?;
                self.lexer.next_token()?;
                Some(name)
            } else {
                None
            };
            let literal = self.parse_key_literal()?;
            values.push(NamedValue { name, literal });

            match self.lexer.current().kind {
                TokenKind::Comma => {
                    self.lexer.next_token()?;
                }
                TokenKind::CloseParen => {
                    self.lexer.next_token()?;
                    break;
                }
                _ => {
                    return Err(QueryError::syntax(
                        format!(
                            "')' or ',' expected in key predicate, found {}",
                            self.lexer.describe_current()
                        ),
                        self.lexer.current().text.clone(),
                        self.lexer.current().position,
                    ));
                }
            }
        }

        validate_key_values(&values, open_position)?;
        Ok(values)
    }

    fn parse_key_literal(&mut self) -> Result<LiteralToken> {
        if self.lexer.current().kind == TokenKind::Minus {
            let minus_position = self.lexer.current().position;
            self.lexer.next_token()?;
            if !self.lexer.current().kind.is_numeric_literal() {
                return Err(QueryError::syntax(
                    "Numeric literal expected after '-'",
                    self.lexer.current().text.clone(),
                    self.lexer.current().position,
                ));
            }
            let literal = self.lexer.current_mut();
            literal.text = format!("-{}", literal.text);
            literal.position = minus_position;
        }

        if !self.lexer.current().kind.is_literal() {
            return Err(QueryError::syntax(
                format!("Key value expected, found {}", self.lexer.describe_current()),
                self.lexer.current().text.clone(),
                self.lexer.current().position,
            ));
        }
        let literal = resolve_literal(self.lexer.current())?;
        self.lexer.next_token()?;
        Ok(literal)
    }
}

/// Keys are either one positional value or uniquely named values, never a mix.
fn validate_key_values(values: &[NamedValue], position: usize) -> Result<()> {
    let positional = values.iter().filter(|v| v.name.is_none()).count();
    if positional > 0 && values.len() > 1 {
        return Err(QueryError::syntax(
            "Key predicates with several values must name every value",
            "",
            position,
        ));
    }

    let mut seen = HashSet::new();
    for name in values.iter().filter_map(|v| v.name.as_deref()) {
        if !seen.insert(name) {
            return Err(QueryError::syntax(
                format!("Duplicate key property '{}'", name),
                name,
                position,
            ));
        }
    }
    Ok(())
}
