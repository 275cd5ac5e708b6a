use pretty_assertions::assert_eq;
use soql_parser::{
    parse_query, DateLiteralVariable, FieldType, LiteralType, LiteralTypeTag, LogicalOperator,
    LogicalPrefix, ParseOptions, RelationalOperator,
};

fn parse(source: &str) -> soql_parser::Query {
    parse_query(source, ParseOptions::default()).expect("valid SOQL")
}

#[test]
fn test_scalar_comparison_classifies_string_literal() {
    let query = parse("SELECT Id FROM Account WHERE Name = 'Acme'");
    let cond = query.r#where.unwrap();
    assert_eq!(cond.field.as_deref(), Some("Name"));
    assert_eq!(cond.operator, RelationalOperator::Equal);
    assert_eq!(cond.value.as_deref(), Some("'Acme'"));
    assert_eq!(
        cond.literal_type,
        Some(LiteralTypeTag::Scalar(LiteralType::String))
    );
}

#[test]
fn test_in_list_with_mixed_types_is_an_array_tag() {
    let query = parse("SELECT Id FROM Account WHERE AnnualRevenue IN (1, 2.5)");
    let cond = query.r#where.unwrap();
    assert_eq!(
        cond.literal_type,
        Some(LiteralTypeTag::Array(vec![LiteralType::Integer, LiteralType::Decimal]))
    );
}

#[test]
fn test_in_list_with_uniform_types_collapses_to_scalar_tag() {
    let query = parse("SELECT Id FROM Account WHERE Rating IN ('Hot', 'Warm')");
    let cond = query.r#where.unwrap();
    assert_eq!(
        cond.literal_type,
        Some(LiteralTypeTag::Scalar(LiteralType::String))
    );
}

#[test]
fn test_not_prefix_and_not_in() {
    let query = parse("SELECT Id FROM Account WHERE NOT Name = 'x' AND Id NOT IN ('1', '2')");
    let first = query.r#where.unwrap();
    assert_eq!(first.logical_prefix, Some(LogicalPrefix::Not));
    let second = first.right.unwrap();
    assert_eq!(second.operator, RelationalOperator::NotIn);
}

#[test]
fn test_currency_prefixed_literal_classification() {
    let query = parse("SELECT Id FROM Opportunity WHERE Amount > USD1000");
    let cond = query.r#where.unwrap();
    assert_eq!(
        cond.literal_type,
        Some(LiteralTypeTag::Scalar(LiteralType::IntegerWithCurrencyPrefix))
    );
    assert_eq!(cond.value.as_deref(), Some("USD1000"));
}

#[test]
fn test_geolocation_nested_in_distance_function() {
    let query = parse(
        "SELECT Id FROM Account WHERE DISTANCE(Location__c, GEOLOCATION(37.775,-122.418), 'mi') < 10",
    );
    let cond = query.r#where.unwrap();
    let func = cond.fn_.expect("DISTANCE is a function expression");
    assert_eq!(func.function_name, "DISTANCE");
    // LHS-of-condition function calls omit isAggregateFn, unlike projection context.
    assert_eq!(func.is_aggregate_fn, None);
    assert_eq!(func.parameters.len(), 3);
}

#[test]
fn test_three_way_and_or_chain_links_right() {
    let query = parse("SELECT Id FROM Account WHERE A = 1 AND B = 2 OR C = 3");
    let a = query.r#where.unwrap();
    assert_eq!(a.logical_operator, Some(LogicalOperator::And));
    let b = a.right.unwrap();
    assert_eq!(b.logical_operator, Some(LogicalOperator::Or));
    let c = b.right.unwrap();
    assert!(c.right.is_none());
}

#[test]
fn test_date_n_literal_variable_extracted() {
    let query = parse("SELECT Id FROM Task WHERE ActivityDate = NEXT_N_DAYS:5");
    let cond = query.r#where.unwrap();
    assert_eq!(cond.date_literal_variable, Some(DateLiteralVariable::Single(5)));
}

#[test]
fn test_subquery_field_count_matches() {
    let query = parse("SELECT Id, Name, (SELECT Id FROM Contacts WHERE LastName != null) FROM Account");
    assert_eq!(query.fields.len(), 3);
    assert!(matches!(&query.fields[2], FieldType::FieldSubquery(_)));
}
