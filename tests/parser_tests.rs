// tests/parser_tests.rs

use odata_query::ast::{
    BinaryOperatorKind, NamedValue, OrderDirection, QueryToken, UnaryOperatorKind,
};
use odata_query::parser::Parser;
use odata_query::{ParserSettings, QueryError, Value};

fn filter(text: &str) -> QueryToken {
    Parser::new(text)
        .and_then(Parser::parse_filter)
        .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", text, e))
}

fn filter_err(text: &str) -> QueryError {
    match Parser::new(text).and_then(Parser::parse_filter) {
        Ok(token) => panic!("expected {:?} to fail, got {:?}", text, token),
        Err(e) => e,
    }
}

fn int(n: i32) -> QueryToken {
    QueryToken::literal(Value::Int32(n), n.to_string())
}

fn prop(name: &str) -> QueryToken {
    QueryToken::property(name, None)
}

// ============================================================================
// Precedence and associativity
// ============================================================================

#[test]
fn test_arithmetic_precedence() {
    // Add(1, Multiply(2, 3))
    assert_eq!(
        filter("1 add 2 mul 3"),
        QueryToken::binary(
            BinaryOperatorKind::Add,
            int(1),
            QueryToken::binary(BinaryOperatorKind::Multiply, int(2), int(3)),
        )
    );
}

#[test]
fn test_parentheses() {
    assert_eq!(
        filter("(1 add 2) mul 3"),
        QueryToken::binary(
            BinaryOperatorKind::Multiply,
            QueryToken::binary(BinaryOperatorKind::Add, int(1), int(2)),
            int(3),
        )
    );
}

#[test]
fn test_left_associativity() {
    assert_eq!(
        filter("1 sub 2 sub 3"),
        QueryToken::binary(
            BinaryOperatorKind::Subtract,
            QueryToken::binary(BinaryOperatorKind::Subtract, int(1), int(2)),
            int(3),
        )
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    match filter("A or B and C") {
        QueryToken::BinaryOperator {
            op: BinaryOperatorKind::Or,
            left,
            right,
        } => {
            assert_eq!(*left, prop("A"));
            assert!(matches!(
                *right,
                QueryToken::BinaryOperator {
                    op: BinaryOperatorKind::And,
                    ..
                }
            ));
        }
        other => panic!("Expected or at the root, got {:?}", other),
    }
}

#[test]
fn test_comparison_binds_tighter_than_and() {
    match filter("Price gt 5 and Price lt 10") {
        QueryToken::BinaryOperator {
            op: BinaryOperatorKind::And,
            left,
            right,
        } => {
            assert!(matches!(
                *left,
                QueryToken::BinaryOperator {
                    op: BinaryOperatorKind::GreaterThan,
                    ..
                }
            ));
            assert!(matches!(
                *right,
                QueryToken::BinaryOperator {
                    op: BinaryOperatorKind::LessThan,
                    ..
                }
            ));
        }
        other => panic!("Expected and at the root, got {:?}", other),
    }
}

#[test]
fn test_all_comparison_keywords() {
    for (keyword, op) in [
        ("eq", BinaryOperatorKind::Equal),
        ("ne", BinaryOperatorKind::NotEqual),
        ("gt", BinaryOperatorKind::GreaterThan),
        ("ge", BinaryOperatorKind::GreaterThanOrEqual),
        ("lt", BinaryOperatorKind::LessThan),
        ("le", BinaryOperatorKind::LessThanOrEqual),
    ] {
        let token = filter(&format!("A {} 1", keyword));
        assert_eq!(token, QueryToken::binary(op, prop("A"), int(1)));
    }
}

#[test]
fn test_name_eq_string() {
    assert_eq!(
        filter("Name eq 'Foo'"),
        QueryToken::binary(
            BinaryOperatorKind::Equal,
            prop("Name"),
            QueryToken::literal(Value::String("Foo".to_string()), "'Foo'"),
        )
    );
}

// ============================================================================
// Unary operators and sign folding
// ============================================================================

#[test]
fn test_negative_literal_is_folded() {
    assert_eq!(
        filter("-5"),
        QueryToken::literal(Value::Int32(-5), "-5")
    );
}

#[test]
fn test_negated_parenthesized_literal() {
    assert_eq!(
        filter("-(5)"),
        QueryToken::unary(UnaryOperatorKind::Negate, int(5))
    );
}

#[test]
fn test_negated_property() {
    assert_eq!(
        filter("-Price"),
        QueryToken::unary(UnaryOperatorKind::Negate, prop("Price"))
    );
}

#[test]
fn test_int32_minimum_folds() {
    assert_eq!(
        filter("-2147483648"),
        QueryToken::literal(Value::Int32(i32::MIN), "-2147483648")
    );
}

#[test]
fn test_folded_literal_position() {
    match filter_err("1 add -datetime'x'") {
        // `-` before a non-numeric literal stays a unary operator
        QueryError::LiteralFormat { position, .. } => assert_eq!(position, 7),
        other => panic!("Expected literal format error, got {:?}", other),
    }
}

#[test]
fn test_not() {
    assert_eq!(
        filter("not Active"),
        QueryToken::unary(UnaryOperatorKind::Not, prop("Active"))
    );
}

#[test]
fn test_not_binds_tighter_than_comparison() {
    assert!(matches!(
        filter("not A eq true"),
        QueryToken::BinaryOperator {
            op: BinaryOperatorKind::Equal,
            ..
        }
    ));
}

// ============================================================================
// Member access, functions and lambdas
// ============================================================================

#[test]
fn test_member_path() {
    assert_eq!(
        filter("Address/City"),
        QueryToken::property("City", Some(prop("Address")))
    );
}

#[test]
fn test_function_call() {
    assert_eq!(
        filter("startswith(Name,'A')"),
        QueryToken::function(
            "startswith",
            vec![
                prop("Name"),
                QueryToken::literal(Value::String("A".to_string()), "'A'"),
            ],
        )
    );
}

#[test]
fn test_function_without_arguments() {
    assert_eq!(filter("now()"), QueryToken::function("now", vec![]));
}

#[test]
fn test_dotted_function_name() {
    match filter("geo.distance(Location, geography'POINT(0 0)') lt 5.0") {
        QueryToken::BinaryOperator { left, .. } => match *left {
            QueryToken::FunctionCall { name, args } => {
                assert_eq!(name, "geo.distance");
                assert_eq!(args.len(), 2);
            }
            other => panic!("Expected function call, got {:?}", other),
        },
        other => panic!("Expected comparison, got {:?}", other),
    }
}

#[test]
fn test_function_cannot_follow_path() {
    assert!(matches!(
        filter_err("Address/length(1)"),
        QueryError::Syntax { .. }
    ));
}

#[test]
fn test_any_without_source() {
    assert_eq!(
        filter("any(d:d/Amount gt 100)"),
        QueryToken::Any {
            source: None,
            parameter: Some("d".to_string()),
            body: Box::new(QueryToken::binary(
                BinaryOperatorKind::GreaterThan,
                QueryToken::property("Amount", Some(prop("d"))),
                int(100),
            )),
        }
    );
}

#[test]
fn test_any_on_path() {
    match filter("Orders/any(o: o/Amount gt 100)") {
        QueryToken::Any {
            source, parameter, ..
        } => {
            assert_eq!(source.as_deref(), Some(&prop("Orders")));
            assert_eq!(parameter.as_deref(), Some("o"));
        }
        other => panic!("Expected any, got {:?}", other),
    }
}

#[test]
fn test_empty_any() {
    assert_eq!(
        filter("Orders/any()"),
        QueryToken::Any {
            source: Some(Box::new(prop("Orders"))),
            parameter: None,
            body: Box::new(QueryToken::literal(Value::Boolean(true), "true")),
        }
    );
}

#[test]
fn test_nested_all_inside_any() {
    match filter("Orders/any(o: o/Lines/all(l: l/Qty gt 0))") {
        QueryToken::Any { body, .. } => {
            assert!(matches!(*body, QueryToken::All { .. }));
        }
        other => panic!("Expected any, got {:?}", other),
    }
}

#[test]
fn test_lambda_requires_colon() {
    assert!(matches!(
        filter_err("Orders/any(o o/Amount)"),
        QueryError::Syntax { .. }
    ));
}

#[test]
fn test_it_parameter() {
    assert_eq!(
        filter("$it/Name"),
        QueryToken::property(
            "Name",
            Some(QueryToken::Parameter {
                name: "$it".to_string()
            })
        )
    );
    assert!(matches!(filter_err("Name/$it"), QueryError::Syntax { .. }));
}

#[test]
fn test_type_segment() {
    assert_eq!(
        filter("Orders/Shop.VipOrder"),
        QueryToken::Cast {
            type_name: "Shop.VipOrder".to_string(),
            instance: Some(Box::new(prop("Orders"))),
        }
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_trailing_input() {
    match filter_err("Name eq 1 2") {
        QueryError::Syntax { text, position, .. } => {
            assert_eq!(text, "2");
            assert_eq!(position, 10);
        }
        other => panic!("Expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_missing_operand() {
    assert!(matches!(
        filter_err("Name eq"),
        QueryError::Syntax { position: 7, .. }
    ));
}

#[test]
fn test_missing_close_paren() {
    assert!(matches!(
        filter_err("(1 add 2"),
        QueryError::Syntax { position: 8, .. }
    ));
}

#[test]
fn test_bad_argument_separator() {
    assert!(matches!(
        filter_err("substring(Name 1)"),
        QueryError::Syntax { .. }
    ));
}

#[test]
fn test_literal_format_error() {
    match filter_err("Born eq datetime'yesterday'") {
        QueryError::LiteralFormat {
            type_name,
            text,
            position,
        } => {
            assert_eq!(type_name, "Edm.DateTime");
            assert_eq!(text, "datetime'yesterday'");
            assert_eq!(position, 8);
        }
        other => panic!("Expected literal format error, got {:?}", other),
    }
}

#[test]
fn test_empty_filter() {
    assert!(matches!(filter_err(""), QueryError::Syntax { .. }));
}

// ============================================================================
// Recursion limit
// ============================================================================

fn nested(depth: usize) -> String {
    format!("{}1{}", "(".repeat(depth), ")".repeat(depth))
}

fn parse_with_limit(text: &str, max_depth: usize) -> Result<QueryToken, QueryError> {
    let settings = ParserSettings::default().with_max_depth(max_depth);
    Parser::with_settings(text, settings).and_then(Parser::parse_filter)
}

#[test]
fn test_recursion_limit_boundary() {
    for parens in 0..10 {
        let text = nested(parens);
        let needed = 8 * (parens + 1);
        assert_eq!(parse_with_limit(&text, needed).unwrap(), int(1));
        assert!(matches!(
            parse_with_limit(&text, needed - 1),
            Err(QueryError::RecursionLimit { limit, .. }) if limit == needed - 1
        ));
    }
}

#[test]
fn test_default_limit_rejects_deep_nesting() {
    let text = nested(200);
    assert!(matches!(
        Parser::new(&text).and_then(Parser::parse_filter),
        Err(QueryError::RecursionLimit { limit: 800, .. })
    ));
    assert!(Parser::new(&nested(90)).and_then(Parser::parse_filter).is_ok());
}

fn assert_limit_boundary(text: &str, needed: usize) {
    assert!(
        parse_with_limit(text, needed).is_ok(),
        "{:?} should parse with a limit of {}",
        text,
        needed
    );
    assert!(matches!(
        parse_with_limit(text, needed - 1),
        Err(QueryError::RecursionLimit { limit, .. }) if limit == needed - 1
    ));
}

#[test]
fn test_binary_chains_count_towards_the_limit() {
    for operators in 1..6 {
        let text = format!("1{}", " add 1".repeat(operators));
        assert_limit_boundary(&text, 8 + operators);

        let text = format!("A{}", " or B".repeat(operators));
        assert_limit_boundary(&text, 8 + operators);
    }
}

#[test]
fn test_unary_chains_count_towards_the_limit() {
    for operators in 1..6 {
        let text = format!("{}true", "not ".repeat(operators));
        assert_limit_boundary(&text, 8 + operators);
    }
}

#[test]
fn test_member_paths_count_towards_the_limit() {
    for segments in 1..6 {
        let text = format!("A{}", "/B".repeat(segments));
        assert_limit_boundary(&text, 8 + segments);
    }
}

#[test]
fn test_default_limit_rejects_long_chains() {
    for text in [
        format!("1{}", " add 1".repeat(5000)),
        format!("A{}", " and B".repeat(5000)),
        format!("A{}", "/B".repeat(5000)),
    ] {
        assert!(matches!(
            Parser::new(&text).and_then(Parser::parse_filter),
            Err(QueryError::RecursionLimit { limit: 800, .. })
        ));
    }
}

#[test]
fn test_long_resource_path_is_limited() {
    let text = format!("A{}", "/B".repeat(5000));
    assert!(matches!(
        Parser::new(&text).and_then(Parser::parse_path),
        Err(QueryError::RecursionLimit { limit: 800, .. })
    ));
}

#[test]
fn test_recursion_limit_reports_position() {
    let err = parse_with_limit("1 add 2", 8).unwrap_err();
    assert_eq!(err.position(), Some(6));
    assert!(err.is_parse_error());
}

// ============================================================================
// $orderby, $select, $expand
// ============================================================================

#[test]
fn test_order_by() {
    let items = Parser::new("Name desc,Id")
        .and_then(Parser::parse_order_by)
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].expression, prop("Name"));
    assert_eq!(items[0].direction, OrderDirection::Descending);
    assert_eq!(items[1].expression, prop("Id"));
    assert_eq!(items[1].direction, OrderDirection::Ascending);
}

#[test]
fn test_order_by_explicit_asc_and_expression() {
    let items = Parser::new("Price mul 2 asc, length(Name) desc")
        .and_then(Parser::parse_order_by)
        .unwrap();
    assert_eq!(items[0].direction, OrderDirection::Ascending);
    assert!(matches!(
        items[0].expression,
        QueryToken::BinaryOperator {
            op: BinaryOperatorKind::Multiply,
            ..
        }
    ));
    assert_eq!(items[1].direction, OrderDirection::Descending);
}

#[test]
fn test_order_by_trailing_comma() {
    assert!(Parser::new("Name,").and_then(Parser::parse_order_by).is_err());
}

#[test]
fn test_select() {
    let select = Parser::new("Name,Address/City,*")
        .and_then(Parser::parse_select)
        .unwrap();
    assert_eq!(
        select.properties,
        vec![
            prop("Name"),
            QueryToken::property("City", Some(prop("Address"))),
            QueryToken::Star { instance: None },
        ]
    );
}

#[test]
fn test_select_star_under_path() {
    let select = Parser::new("Orders/*").and_then(Parser::parse_select).unwrap();
    assert_eq!(
        select.properties,
        vec![QueryToken::Star {
            instance: Some(Box::new(prop("Orders")))
        }]
    );
}

#[test]
fn test_expand() {
    let expand = Parser::new("Orders,Orders/Lines")
        .and_then(Parser::parse_expand)
        .unwrap();
    assert_eq!(expand.properties.len(), 2);
    assert_eq!(
        expand.properties[1],
        QueryToken::property("Lines", Some(prop("Orders")))
    );
}

// ============================================================================
// Key values and resource paths
// ============================================================================

#[test]
fn test_positional_key() {
    let values = Parser::new("(1)").and_then(Parser::parse_key_values).unwrap();
    assert_eq!(
        values,
        vec![NamedValue {
            name: None,
            literal: odata_query::LiteralToken {
                value: Value::Int32(1),
                raw_text: "1".to_string(),
            },
        }]
    );
}

#[test]
fn test_negative_key() {
    let values = Parser::new("(-1)").and_then(Parser::parse_key_values).unwrap();
    assert_eq!(values[0].literal.value, Value::Int32(-1));
    assert_eq!(values[0].literal.raw_text, "-1");
}

#[test]
fn test_named_keys() {
    let values = Parser::new("(OrderId=1,ProductId='X')")
        .and_then(Parser::parse_key_values)
        .unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].name.as_deref(), Some("OrderId"));
    assert_eq!(values[1].name.as_deref(), Some("ProductId"));
    assert_eq!(values[1].literal.value, Value::String("X".to_string()));
}

#[test]
fn test_invalid_keys() {
    for text in ["()", "(1,2)", "(A=1,2)", "(A=1,A=2)", "(Name)"] {
        assert!(
            matches!(
                Parser::new(text).and_then(Parser::parse_key_values),
                Err(QueryError::Syntax { .. })
            ),
            "{} should be rejected",
            text
        );
    }
}

#[test]
fn test_resource_path() {
    let path = Parser::new("/Customers(1)/Orders")
        .and_then(Parser::parse_path)
        .unwrap();
    match path {
        QueryToken::Segment { name, key, parent } => {
            assert_eq!(name, "Orders");
            assert!(key.is_empty());
            match parent.as_deref() {
                Some(QueryToken::Segment { name, key, parent }) => {
                    assert_eq!(name, "Customers");
                    assert_eq!(key.len(), 1);
                    assert!(parent.is_none());
                }
                other => panic!("Expected parent segment, got {:?}", other),
            }
        }
        other => panic!("Expected segment, got {:?}", other),
    }
}
