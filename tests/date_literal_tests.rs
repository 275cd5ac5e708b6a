use pretty_assertions::assert_eq;
use soql_parser::{parse_query, DateLiteralVariable, LiteralType, LiteralTypeTag, ParseOptions};

fn parse(source: &str) -> soql_parser::Query {
    parse_query(source, ParseOptions::default()).expect("valid SOQL")
}

#[test]
fn test_bare_date_literal_has_no_variable() {
    let query = parse("SELECT Id FROM Opportunity WHERE CloseDate = THIS_QUARTER");
    let cond = query.r#where.unwrap();
    assert_eq!(
        cond.literal_type,
        Some(LiteralTypeTag::Scalar(LiteralType::DateLiteral))
    );
    assert!(cond.date_literal_variable.is_none());
}

#[test]
fn test_date_n_literal_has_variable() {
    let query = parse("SELECT Id FROM Opportunity WHERE CloseDate = LAST_N_QUARTERS:2");
    let cond = query.r#where.unwrap();
    assert_eq!(
        cond.literal_type,
        Some(LiteralTypeTag::Scalar(LiteralType::DateNLiteral))
    );
    assert_eq!(cond.date_literal_variable, Some(DateLiteralVariable::Single(2)));
    assert_eq!(cond.value.as_deref(), Some("LAST_N_QUARTERS:2"));
}

#[test]
fn test_date_n_literal_inside_array_has_per_element_variables() {
    let query =
        parse("SELECT Id FROM Opportunity WHERE CloseDate IN (LAST_N_DAYS:7, TODAY, NEXT_N_DAYS:3)");
    let cond = query.r#where.unwrap();
    assert_eq!(
        cond.date_literal_variable,
        Some(DateLiteralVariable::PerElement(vec![Some(7), None, Some(3)]))
    );
}

#[test]
fn test_plain_date_value_has_no_variable() {
    let query = parse("SELECT Id FROM Opportunity WHERE CloseDate = 2024-01-01");
    let cond = query.r#where.unwrap();
    assert_eq!(cond.literal_type, Some(LiteralTypeTag::Scalar(LiteralType::Date)));
    assert!(cond.date_literal_variable.is_none());
}
