use pretty_assertions::assert_eq;
use soql_parser::{is_query_valid, parse_query, ParseOptions, SoqlError};

#[test]
fn test_valid_query_parses_and_is_valid() {
    let source = "SELECT Id, Name FROM Account WHERE Name = 'Acme' LIMIT 10";
    assert!(is_query_valid(source, ParseOptions::default()));
    let query = parse_query(source, ParseOptions::default()).unwrap();
    assert_eq!(query.s_object, "Account");
    assert_eq!(query.limit, Some(10));
}

#[test]
fn test_syntax_error_raises_by_default() {
    let source = "SELECT Id FROM";
    assert!(!is_query_valid(source, ParseOptions::default()));
    let err = parse_query(source, ParseOptions::default()).unwrap_err();
    match err {
        SoqlError::Syntax(errors) => assert!(!errors.is_empty()),
        other => panic!("expected SoqlError::Syntax, got {other:?}"),
    }
}

#[test]
fn test_continue_if_errors_returns_best_effort_query() {
    let options = ParseOptions {
        continue_if_errors: true,
        ..ParseOptions::default()
    };
    // The empty field between the comma and FROM is malformed and gets
    // recorded as an error, but the field-list recovery resynchronizes on
    // FROM so the rest of the query still comes back intact.
    let source = "SELECT Id, FROM Account WHERE Name = 'x'";
    assert!(parse_query(source, ParseOptions::default()).is_err());
    let query = parse_query(source, options).unwrap();
    assert_eq!(query.s_object, "Account");
    assert_eq!(query.fields.len(), 1);
    assert!(query.r#where.is_some());
}

#[test]
fn test_lex_error_raises_by_default_but_accumulates_with_continue_if_errors() {
    // The unterminated string trails a complete, valid query, so the only
    // problem is the lex failure itself.
    let source = "SELECT Id FROM Account 'unterminated";
    let err = parse_query(source, ParseOptions::default()).unwrap_err();
    assert!(matches!(err, SoqlError::Lex(_)));

    let options = ParseOptions {
        continue_if_errors: true,
        ..ParseOptions::default()
    };
    let query = parse_query(source, options).unwrap();
    assert_eq!(query.s_object, "Account");
}

#[test]
fn test_validity_matches_raise_behavior() {
    let valid = "SELECT Id FROM Account";
    let invalid = "SELECT Id FROM Account WHERE";
    assert_eq!(
        is_query_valid(valid, ParseOptions::default()),
        parse_query(valid, ParseOptions::default()).is_ok()
    );
    assert_eq!(
        is_query_valid(invalid, ParseOptions::default()),
        parse_query(invalid, ParseOptions::default()).is_ok()
    );
}
