use soql_parser::{tokenize, TokenKind};

#[test]
fn test_keywords_case_insensitive() {
    let tokens = tokenize("SELECT Id FROM Account WHERE Id != null").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Select);
    assert_eq!(tokens[2].kind, TokenKind::From);
    assert_eq!(tokens[4].kind, TokenKind::Where);
}

#[test]
fn test_aggregate_and_date_function_keywords() {
    let tokens = tokenize("COUNT_DISTINCT SUM CALENDAR_MONTH CONVERT_CURRENCY TOLABEL").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::CountDistinct);
    assert_eq!(tokens[1].kind, TokenKind::Sum);
    assert_eq!(tokens[2].kind, TokenKind::CalendarMonth);
    assert_eq!(tokens[3].kind, TokenKind::ConvertCurrency);
    assert_eq!(tokens[4].kind, TokenKind::ToLabel);
}

#[test]
fn test_relationship_path_is_one_identifier_token() {
    let tokens = tokenize("Account.Owner.Manager.Name").unwrap();
    assert!(matches!(&tokens[0].kind, TokenKind::Identifier(s) if s == "Account.Owner.Manager.Name"));
    assert_eq!(tokens.len(), 2);
}

#[test]
fn test_date_n_literal_tokens_split_on_colon() {
    let tokens = tokenize("NEXT_N_DAYS:30").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::NextNDays);
    assert_eq!(tokens[1].kind, TokenKind::Colon);
    assert!(matches!(tokens[2].kind, TokenKind::UnsignedInteger(30)));
}

#[test]
fn test_currency_prefixed_decimal() {
    let tokens = tokenize("EUR19.99").unwrap();
    assert!(
        matches!(&tokens[0].kind, TokenKind::CurrencyPrefixedDecimal((code, n)) if code == "EUR" && (*n - 19.99).abs() < 1e-9)
    );
}

#[test]
fn test_negative_and_positive_numbers() {
    let tokens = tokenize("-5 +5 -5.5").unwrap();
    assert!(matches!(tokens[0].kind, TokenKind::SignedInteger(-5)));
    assert!(matches!(tokens[1].kind, TokenKind::SignedInteger(5)));
    assert!(matches!(tokens[2].kind, TokenKind::SignedReal(n) if (n + 5.5).abs() < 1e-9));
}

#[test]
fn test_unterminated_string_is_a_lex_error() {
    assert!(tokenize("'unterminated").is_err());
}

#[test]
fn test_operators() {
    let tokens = tokenize("= != <> <= >= < >").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Eq);
    assert_eq!(tokens[1].kind, TokenKind::NotEq);
    assert_eq!(tokens[2].kind, TokenKind::LtGt);
    assert_eq!(tokens[3].kind, TokenKind::LtEq);
    assert_eq!(tokens[4].kind, TokenKind::GtEq);
    assert_eq!(tokens[5].kind, TokenKind::Lt);
    assert_eq!(tokens[6].kind, TokenKind::Gt);
}
