// tests/output_tests.rs

use odata_query::ast::{BinaryOperatorKind, QueryToken, UnaryOperatorKind};
use odata_query::edm::{Model, StructuredType, TypeReference};
use odata_query::output::{
    node_to_json, order_by_text, paths_text, to_query_text, token_to_json, value_to_json,
};
use odata_query::parser::Parser;
use odata_query::semantic::Binder;
use odata_query::settings::DEFAULT_MAX_TREE_DEPTH;
use odata_query::{QueryError, Value};
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;

fn canonical(text: &str) -> String {
    to_query_text(&Parser::new(text).and_then(Parser::parse_filter).unwrap())
}

// ============================================================================
// Query text
// ============================================================================

#[test]
fn test_minimal_parentheses() {
    assert_eq!(canonical("Price add 1 mul 2"), "Price add 1 mul 2");
    assert_eq!(canonical("(Price add 1) mul 2"), "(Price add 1) mul 2");
    assert_eq!(canonical("((Price))"), "Price");
    assert_eq!(canonical("(A or B) and C"), "(A or B) and C");
    assert_eq!(canonical("A or (B and C)"), "A or B and C");
}

#[test]
fn test_left_associativity_preserved() {
    assert_eq!(canonical("(Price sub 1) sub 2"), "Price sub 1 sub 2");
    assert_eq!(canonical("Price sub (1 sub 2)"), "Price sub (1 sub 2)");
}

#[test]
fn test_unary_forms() {
    assert_eq!(canonical("not (A and B)"), "not (A and B)");
    assert_eq!(canonical("not not A"), "not not A");
    assert_eq!(canonical("-5"), "-5");
    assert_eq!(canonical("-(5)"), "-(5)");
    assert_eq!(canonical("- Price"), "-Price");
    assert_eq!(canonical("-(Price add 1)"), "-(Price add 1)");
}

#[test]
fn test_literals_use_raw_text() {
    assert_eq!(canonical("Name eq 'O''Neil'"), "Name eq 'O''Neil'");
    assert_eq!(canonical("Amount eq 1.50m"), "Amount eq 1.50m");
    assert_eq!(
        canonical("Born lt datetime'2012-05-01T10:00'"),
        "Born lt datetime'2012-05-01T10:00'"
    );
}

#[test]
fn test_functions_and_lambdas() {
    assert_eq!(
        canonical("startswith(Name, 'A') and Orders/any(o: o/Amount gt 1)"),
        "startswith(Name,'A') and Orders/any(o:o/Amount gt 1)"
    );
    assert_eq!(canonical("Orders/any()"), "Orders/any()");
    assert_eq!(canonical("Orders/all(o: true)"), "Orders/all(o:true)");
}

#[test]
fn test_paths() {
    assert_eq!(canonical("$it/Address/City"), "$it/Address/City");
    assert_eq!(canonical("Orders/Shop.VipOrder/Level"), "Orders/Shop.VipOrder/Level");
    assert_eq!(canonical("(A or B)/Name"), "(A or B)/Name");
}

#[test]
fn test_order_by_text() {
    let items = Parser::new("Name desc, Id asc").unwrap().parse_order_by().unwrap();
    assert_eq!(order_by_text(&items), "Name desc,Id");
}

#[test]
fn test_select_and_expand_text() {
    let select = Parser::new("Name, Address/City, *").unwrap().parse_select().unwrap();
    assert_eq!(paths_text(&select.properties), "Name,Address/City,*");

    let expand = Parser::new("Orders/Lines").unwrap().parse_expand().unwrap();
    assert_eq!(paths_text(&expand.properties), "Orders/Lines");
}

#[test]
fn test_resource_path_text() {
    let path = Parser::new("Customers(1)/Orders(OrderId=1,ProductId=2)")
        .unwrap()
        .parse_path()
        .unwrap();
    assert_eq!(
        to_query_text(&path),
        "Customers(1)/Orders(OrderId=1,ProductId=2)"
    );
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn test_token_json() {
    let token = Parser::new("Price gt 5").unwrap().parse_filter().unwrap();
    assert_eq!(
        token_to_json(&token).unwrap(),
        json!({
            "kind": "BinaryOperator",
            "operator": "gt",
            "left": { "kind": "PropertyAccess", "name": "Price", "instance": null },
            "right": { "kind": "Literal", "value": 5, "text": "5" }
        })
    );
}

#[test]
fn test_lambda_json() {
    let token = Parser::new("Orders/any(o: o/Shipped)").unwrap().parse_filter().unwrap();
    let json = token_to_json(&token).unwrap();
    assert_eq!(json["kind"], "Any");
    assert_eq!(json["parameter"], "o");
    assert_eq!(json["source"]["name"], "Orders");
    assert_eq!(json["body"]["instance"]["name"], "o");
}

#[test]
fn test_node_json() {
    let mut model = Model::new();
    model.add_type(
        StructuredType::entity("Shop", "Product")
            .with_property("Name", TypeReference::string(true)),
    );
    let token = Parser::new("Name eq null").unwrap().parse_filter().unwrap();
    let clause = Binder::new(&model, TypeReference::structured("Shop.Product", false))
        .bind_filter(&token)
        .unwrap();
    let json = node_to_json(&clause.expression).unwrap();

    assert_eq!(json["kind"], "BinaryOperator");
    assert_eq!(json["type"], serde_json::Value::Null);
    assert_eq!(
        json["left"]["type"],
        json!({ "name": "Edm.String", "nullable": true })
    );
    assert_eq!(json["left"]["source"]["kind"], "RangeVariable");
    assert_eq!(json["left"]["source"]["name"], "$it");
    assert_eq!(json["right"]["kind"], "Constant");
    assert_eq!(json["right"]["type"], serde_json::Value::Null);
}

#[test]
fn test_value_json() {
    assert_eq!(value_to_json(&Value::Binary(vec![0x0a, 0xff])), json!("0AFF"));
    assert_eq!(
        value_to_json(&Value::Decimal(Decimal::from_str("1.50").unwrap())),
        json!("1.50")
    );
    assert_eq!(value_to_json(&Value::Double(f64::NAN)), json!("NaN"));
    assert_eq!(value_to_json(&Value::Double(1.5)), json!(1.5));
    assert_eq!(value_to_json(&Value::Int64(7)), json!(7));
    assert_eq!(value_to_json(&Value::Null), serde_json::Value::Null);
}

// ============================================================================
// Deep trees
// ============================================================================

fn negated(depth: usize) -> QueryToken {
    let mut token = QueryToken::property("Active", None);
    for _ in 0..depth {
        token = QueryToken::unary(UnaryOperatorKind::Not, token);
    }
    token
}

#[test]
fn test_json_depth_boundary() {
    // `depth` operators plus the leaf
    let deepest = negated(DEFAULT_MAX_TREE_DEPTH - 1);
    assert!(token_to_json(&deepest).is_ok());

    let too_deep = negated(DEFAULT_MAX_TREE_DEPTH);
    assert!(matches!(
        token_to_json(&too_deep),
        Err(QueryError::RecursionLimit {
            limit: DEFAULT_MAX_TREE_DEPTH,
            position: None,
        })
    ));
}

#[test]
fn test_tree_at_default_parse_limit_is_written_safely() {
    // 798 levels, just inside the default parser limit of 800
    let text = format!("{}true", "not ".repeat(790));
    let token = Parser::new(&text).unwrap().parse_filter().unwrap();

    assert!(matches!(
        token_to_json(&token),
        Err(QueryError::RecursionLimit { position: None, .. })
    ));
    let printed = to_query_text(&token);
    assert_eq!(printed, text);
    assert_eq!(Parser::new(&printed).unwrap().parse_filter().unwrap(), token);
}

// ============================================================================
// Round trip
// ============================================================================

fn binary_operator() -> impl Strategy<Value = BinaryOperatorKind> {
    prop::sample::select(vec![
        BinaryOperatorKind::Or,
        BinaryOperatorKind::And,
        BinaryOperatorKind::Equal,
        BinaryOperatorKind::NotEqual,
        BinaryOperatorKind::GreaterThan,
        BinaryOperatorKind::GreaterThanOrEqual,
        BinaryOperatorKind::LessThan,
        BinaryOperatorKind::LessThanOrEqual,
        BinaryOperatorKind::Add,
        BinaryOperatorKind::Subtract,
        BinaryOperatorKind::Multiply,
        BinaryOperatorKind::Divide,
        BinaryOperatorKind::Modulo,
    ])
}

fn leaf() -> impl Strategy<Value = QueryToken> {
    prop_oneof![
        "P[a-z]{0,4}".prop_map(|name| QueryToken::property(name, None)),
        (-1000i32..1000).prop_map(|n| QueryToken::literal(Value::Int32(n), n.to_string())),
        "[a-z]{0,5}".prop_map(|s| {
            let raw = format!("'{}'", s);
            QueryToken::literal(Value::String(s), raw)
        }),
    ]
}

fn expression() -> impl Strategy<Value = QueryToken> {
    leaf().prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (binary_operator(), inner.clone(), inner.clone())
                .prop_map(|(op, left, right)| QueryToken::binary(op, left, right)),
            (
                prop::sample::select(vec![UnaryOperatorKind::Not, UnaryOperatorKind::Negate]),
                inner.clone()
            )
                .prop_map(|(op, operand)| QueryToken::unary(op, operand)),
            ("Fn[a-z]{0,3}", prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(name, args)| QueryToken::function(name, args)),
            (inner.clone(), "P[a-z]{0,4}")
                .prop_map(|(instance, name)| QueryToken::property(name, Some(instance))),
            ("P[a-z]{0,4}", "x[a-z]{0,2}", inner).prop_map(|(source, parameter, body)| {
                QueryToken::Any {
                    source: Some(Box::new(QueryToken::property(source, None))),
                    parameter: Some(parameter),
                    body: Box::new(body),
                }
            }),
        ]
    })
}

fn parse(text: &str) -> Result<QueryToken, QueryError> {
    Parser::new(text).and_then(Parser::parse_filter)
}

/// Printed text with one character inserted or removed.
fn mutated_text() -> impl Strategy<Value = String> {
    let edit = prop::sample::select(vec![
        None,
        Some('('),
        Some(')'),
        Some('\''),
        Some(','),
        Some('/'),
        Some(':'),
        Some(' '),
        Some('-'),
        Some('a'),
        Some('1'),
    ]);
    (expression(), any::<prop::sample::Index>(), edit).prop_map(|(token, at, edit)| {
        let mut chars: Vec<char> = to_query_text(&token).chars().collect();
        match edit {
            Some(c) => chars.insert(at.index(chars.len() + 1), c),
            None if !chars.is_empty() => {
                chars.remove(at.index(chars.len()));
            }
            None => {}
        }
        chars.into_iter().collect()
    })
}

proptest! {
    #[test]
    fn parsing_the_same_text_twice_agrees(text in "[ -~]{0,40}") {
        prop_assert_eq!(parse(&text), parse(&text));
    }

    #[test]
    fn mutated_text_parses_the_same_way_twice(text in mutated_text()) {
        let first = parse(&text);
        prop_assert_eq!(&first, &parse(&text));
        if first.is_ok() {
            // Success means the whole input was consumed
            let extended = format!("{} )", text);
            prop_assert!(parse(&extended).is_err(), "{:?} parsed", extended);
        }
    }

    #[test]
    fn trailing_input_is_rejected(
        token in expression(),
        tail in prop::sample::select(vec![" )", " ,", " P", " 1", " eq", "/", " and"]),
    ) {
        let text = format!("{}{}", to_query_text(&token), tail);
        let result = parse(&text);
        prop_assert!(result.is_err(), "{:?} parsed as {:?}", text, result);
    }

    #[test]
    fn printed_text_parses_back_to_the_same_tree(token in expression()) {
        let text = to_query_text(&token);
        let reparsed = Parser::new(&text).and_then(Parser::parse_filter);
        prop_assert!(reparsed.is_ok(), "{:?} failed to parse: {:?}", text, reparsed);
        let reparsed = reparsed.unwrap();
        prop_assert_eq!(&reparsed, &token, "text was {:?}", text);
        prop_assert_eq!(to_query_text(&reparsed), text);
    }
}
