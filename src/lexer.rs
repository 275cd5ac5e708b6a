//! Lexer for SOQL (Salesforce Object Query Language) query text.
//!
//! Token categories follow the source grammar exactly (see spec §4.1):
//! keywords, aggregate/date functions, date literals, date-N literals,
//! numeric/date/string literals and identifiers. Token variant names are
//! stable — the parser and AST builder pattern-match on them directly for
//! literal classification.

use logos::Logos;
use std::fmt;

/// A byte-offset range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum TokenKind {
    // ---- Keywords ----
    #[token("select", ignore(ascii_case))]
    Select,
    #[token("from", ignore(ascii_case))]
    From,
    #[token("where", ignore(ascii_case))]
    Where,
    #[token("with", ignore(ascii_case))]
    With,
    #[token("data", ignore(ascii_case))]
    Data,
    #[token("category", ignore(ascii_case))]
    Category,
    #[token("group", ignore(ascii_case))]
    Group,
    #[token("by", ignore(ascii_case))]
    By,
    #[token("having", ignore(ascii_case))]
    Having,
    #[token("order", ignore(ascii_case))]
    Order,
    #[token("asc", ignore(ascii_case))]
    Asc,
    #[token("desc", ignore(ascii_case))]
    Desc,
    #[token("nulls", ignore(ascii_case))]
    Nulls,
    #[token("first", ignore(ascii_case))]
    First,
    #[token("last", ignore(ascii_case))]
    Last,
    #[token("limit", ignore(ascii_case))]
    Limit,
    #[token("offset", ignore(ascii_case))]
    Offset,
    #[token("for", ignore(ascii_case))]
    For,
    #[token("view", ignore(ascii_case))]
    View,
    #[token("reference", ignore(ascii_case))]
    Reference,
    #[token("update", ignore(ascii_case))]
    Update,
    #[token("tracking", ignore(ascii_case))]
    Tracking,
    #[token("viewstat", ignore(ascii_case))]
    Viewstat,
    #[token("using", ignore(ascii_case))]
    Using,
    #[token("scope", ignore(ascii_case))]
    Scope,
    #[token("typeof", ignore(ascii_case))]
    Typeof,
    #[token("when", ignore(ascii_case))]
    When,
    #[token("then", ignore(ascii_case))]
    Then,
    #[token("else", ignore(ascii_case))]
    Else,
    #[token("end", ignore(ascii_case))]
    End,
    #[token("security_enforced", ignore(ascii_case))]
    SecurityEnforced,
    #[token("above_or_below", ignore(ascii_case))]
    AboveOrBelow,
    #[token("at", ignore(ascii_case))]
    At,
    #[token("above", ignore(ascii_case))]
    Above,
    #[token("below", ignore(ascii_case))]
    Below,
    #[token("null", ignore(ascii_case))]
    Null,
    #[token("true", ignore(ascii_case))]
    True,
    #[token("false", ignore(ascii_case))]
    False,
    #[token("and", ignore(ascii_case))]
    And,
    #[token("or", ignore(ascii_case))]
    Or,
    #[token("not", ignore(ascii_case))]
    Not,
    #[token("like", ignore(ascii_case))]
    Like,
    #[token("in", ignore(ascii_case))]
    In,
    #[token("includes", ignore(ascii_case))]
    Includes,
    #[token("excludes", ignore(ascii_case))]
    Excludes,

    // ---- Aggregate / date / other functions ----
    #[token("count_distinct", ignore(ascii_case))]
    CountDistinct,
    #[token("count", ignore(ascii_case))]
    Count,
    #[token("sum", ignore(ascii_case))]
    Sum,
    #[token("avg", ignore(ascii_case))]
    Avg,
    #[token("min", ignore(ascii_case))]
    Min,
    #[token("max", ignore(ascii_case))]
    Max,
    #[token("calendar_month", ignore(ascii_case))]
    CalendarMonth,
    #[token("calendar_quarter", ignore(ascii_case))]
    CalendarQuarter,
    #[token("calendar_year", ignore(ascii_case))]
    CalendarYear,
    #[token("day_in_month", ignore(ascii_case))]
    DayInMonth,
    #[token("day_in_week", ignore(ascii_case))]
    DayInWeek,
    #[token("day_in_year", ignore(ascii_case))]
    DayInYear,
    #[token("day_only", ignore(ascii_case))]
    DayOnly,
    #[token("fiscal_month", ignore(ascii_case))]
    FiscalMonth,
    #[token("fiscal_quarter", ignore(ascii_case))]
    FiscalQuarter,
    #[token("fiscal_year", ignore(ascii_case))]
    FiscalYear,
    #[token("hour_in_day", ignore(ascii_case))]
    HourInDay,
    #[token("week_in_month", ignore(ascii_case))]
    WeekInMonth,
    #[token("week_in_year", ignore(ascii_case))]
    WeekInYear,
    #[token("cube", ignore(ascii_case))]
    Cube,
    #[token("rollup", ignore(ascii_case))]
    Rollup,
    #[token("grouping", ignore(ascii_case))]
    Grouping,
    #[token("format", ignore(ascii_case))]
    Format,
    #[token("convert_currency", ignore(ascii_case))]
    ConvertCurrency,
    #[token("tolabel", ignore(ascii_case))]
    ToLabel,
    #[token("distance", ignore(ascii_case))]
    Distance,
    #[token("geolocation", ignore(ascii_case))]
    Geolocation,

    // ---- Date literals (no suffix) ----
    #[token("yesterday", ignore(ascii_case))]
    Yesterday,
    #[token("today", ignore(ascii_case))]
    Today,
    #[token("tomorrow", ignore(ascii_case))]
    Tomorrow,
    #[token("last_week", ignore(ascii_case))]
    LastWeek,
    #[token("this_week", ignore(ascii_case))]
    ThisWeek,
    #[token("next_week", ignore(ascii_case))]
    NextWeek,
    #[token("last_month", ignore(ascii_case))]
    LastMonth,
    #[token("this_month", ignore(ascii_case))]
    ThisMonth,
    #[token("next_month", ignore(ascii_case))]
    NextMonth,
    #[token("last_90_days", ignore(ascii_case))]
    Last90Days,
    #[token("next_90_days", ignore(ascii_case))]
    Next90Days,
    #[token("this_quarter", ignore(ascii_case))]
    ThisQuarter,
    #[token("last_quarter", ignore(ascii_case))]
    LastQuarter,
    #[token("next_quarter", ignore(ascii_case))]
    NextQuarter,
    #[token("this_year", ignore(ascii_case))]
    ThisYear,
    #[token("last_year", ignore(ascii_case))]
    LastYear,
    #[token("next_year", ignore(ascii_case))]
    NextYear,
    #[token("this_fiscal_quarter", ignore(ascii_case))]
    ThisFiscalQuarter,
    #[token("last_fiscal_quarter", ignore(ascii_case))]
    LastFiscalQuarter,
    #[token("next_fiscal_quarter", ignore(ascii_case))]
    NextFiscalQuarter,
    #[token("this_fiscal_year", ignore(ascii_case))]
    ThisFiscalYear,
    #[token("last_fiscal_year", ignore(ascii_case))]
    LastFiscalYear,
    #[token("next_fiscal_year", ignore(ascii_case))]
    NextFiscalYear,

    // ---- Date-N literals (bare name; ':N' is Colon + UnsignedInteger) ----
    #[token("next_n_days", ignore(ascii_case))]
    NextNDays,
    #[token("last_n_days", ignore(ascii_case))]
    LastNDays,
    #[token("n_days_ago", ignore(ascii_case))]
    NDaysAgo,
    #[token("next_n_weeks", ignore(ascii_case))]
    NextNWeeks,
    #[token("last_n_weeks", ignore(ascii_case))]
    LastNWeeks,
    #[token("n_weeks_ago", ignore(ascii_case))]
    NWeeksAgo,
    #[token("next_n_months", ignore(ascii_case))]
    NextNMonths,
    #[token("last_n_months", ignore(ascii_case))]
    LastNMonths,
    #[token("n_months_ago", ignore(ascii_case))]
    NMonthsAgo,
    #[token("next_n_quarters", ignore(ascii_case))]
    NextNQuarters,
    #[token("last_n_quarters", ignore(ascii_case))]
    LastNQuarters,
    #[token("n_quarters_ago", ignore(ascii_case))]
    NQuartersAgo,
    #[token("next_n_years", ignore(ascii_case))]
    NextNYears,
    #[token("last_n_years", ignore(ascii_case))]
    LastNYears,
    #[token("n_years_ago", ignore(ascii_case))]
    NYearsAgo,
    #[token("next_n_fiscal_quarters", ignore(ascii_case))]
    NextNFiscalQuarters,
    #[token("last_n_fiscal_quarters", ignore(ascii_case))]
    LastNFiscalQuarters,
    #[token("n_fiscal_quarters_ago", ignore(ascii_case))]
    NFiscalQuartersAgo,
    #[token("next_n_fiscal_years", ignore(ascii_case))]
    NextNFiscalYears,
    #[token("last_n_fiscal_years", ignore(ascii_case))]
    LastNFiscalYears,
    #[token("n_fiscal_years_ago", ignore(ascii_case))]
    NFiscalYearsAgo,

    // ---- Punctuation ----
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<>")]
    LtGt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // ---- Literals ----
    // Currency-prefixed literals must win over a bare Identifier when the
    // whole token is a 3-letter ISO code glued to a number (USD100,
    // USD100.50); this is inherently ambiguous with an identifier that
    // happens to have this exact shape, same tradeoff the source grammar
    // accepts since the distinction is really about grammatical position.
    #[regex(r"[A-Z]{3}[0-9]+\.[0-9]+", priority = 3, callback = parse_currency_decimal)]
    CurrencyPrefixedDecimal((String, f64)),
    #[regex(r"[A-Z]{3}[0-9]+", priority = 3, callback = parse_currency_integer)]
    CurrencyPrefixedInteger((String, i64)),

    #[regex(r"[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(Z|[+-][0-9]{2}:[0-9]{2})", |lex| lex.slice().to_string())]
    DateTime(String),
    #[regex(r"[0-9]{4}-[0-9]{2}-[0-9]{2}", |lex| lex.slice().to_string())]
    Date(String),

    #[regex(r"[+-][0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    SignedReal(f64),
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    UnsignedReal(f64),
    #[regex(r"[+-][0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    SignedInteger(i64),
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    UnsignedInteger(u64),

    #[regex(r"'([^'\\]|\\.)*'", parse_string)]
    StringLiteral(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*", |lex| lex.slice().to_string())]
    Identifier(String),

    Eof,
}

fn parse_string(lex: &mut logos::Lexer<TokenKind>) -> Option<String> {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut result = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('\'') => result.push('\''),
                Some('\\') => result.push('\\'),
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    Some(result)
}

fn parse_currency_integer(lex: &mut logos::Lexer<TokenKind>) -> Option<(String, i64)> {
    let slice = lex.slice();
    let code = slice[..3].to_string();
    let value = slice[3..].parse::<i64>().ok()?;
    Some((code, value))
}

fn parse_currency_decimal(lex: &mut logos::Lexer<TokenKind>) -> Option<(String, f64)> {
    let slice = lex.slice();
    let code = slice[..3].to_string();
    let value = slice[3..].parse::<f64>().ok()?;
    Some((code, value))
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(s) => write!(f, "{}", s),
            TokenKind::StringLiteral(s) => write!(f, "'{}'", s),
            TokenKind::UnsignedInteger(n) => write!(f, "{}", n),
            TokenKind::SignedInteger(n) => write!(f, "{}", n),
            TokenKind::UnsignedReal(n) => write!(f, "{}", n),
            TokenKind::SignedReal(n) => write!(f, "{}", n),
            TokenKind::Date(s) => write!(f, "{}", s),
            TokenKind::DateTime(s) => write!(f, "{}", s),
            TokenKind::Eof => write!(f, "end of input"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Lexer that wraps `logos` with two-token lookahead and reports lexical
/// errors instead of silently skipping them.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    peeked: Option<Token>,
    peeked2: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            peeked: None,
            peeked2: None,
        }
    }

    fn read_next(&mut self) -> Result<Token, Span> {
        match self.inner.next() {
            Some(Ok(kind)) => {
                let span = self.inner.span();
                Ok(Token::new(kind, Span::new(span.start, span.end)))
            }
            Some(Err(())) => {
                let span = self.inner.span();
                Err(Span::new(span.start, span.end))
            }
            None => Ok(Token::new(TokenKind::Eof, Span::new(0, 0))),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, Span> {
        if let Some(token) = self.peeked.take() {
            self.peeked = self.peeked2.take();
            return Ok(token);
        }
        self.read_next()
    }

    pub fn peek(&mut self) -> Result<&Token, Span> {
        if self.peeked.is_none() {
            self.peeked = Some(self.read_next()?);
        }
        Ok(self.peeked.as_ref().unwrap())
    }

    pub fn peek_second(&mut self) -> Result<&Token, Span> {
        if self.peeked.is_none() {
            self.peeked = Some(self.read_next()?);
        }
        if self.peeked2.is_none() {
            self.peeked2 = Some(self.read_next()?);
        }
        Ok(self.peeked2.as_ref().unwrap())
    }
}

/// Tokenize an entire source string, stopping at the first lex error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Span> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = tokenize("SELECT select Select").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Select);
        assert_eq!(tokens[1].kind, TokenKind::Select);
        assert_eq!(tokens[2].kind, TokenKind::Select);
    }

    #[test]
    fn test_identifier_preserves_case() {
        let tokens = tokenize("MyCustom__c").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Identifier(s) if s == "MyCustom__c"));
    }

    #[test]
    fn test_dotted_identifier_single_token() {
        let tokens = tokenize("Account.Owner.Name").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Identifier(s) if s == "Account.Owner.Name"));
    }

    #[test]
    fn test_string_literal_escapes() {
        let tokens = tokenize(r"'O\'Brien'").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::StringLiteral(s) if s == "O'Brien"));
    }

    #[test]
    fn test_date_and_datetime() {
        let tokens = tokenize("1999-01-01 1999-01-01T23:01:01Z").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Date(s) if s == "1999-01-01"));
        assert!(matches!(&tokens[1].kind, TokenKind::DateTime(s) if s == "1999-01-01T23:01:01Z"));
    }

    #[test]
    fn test_date_n_literal_with_colon() {
        let tokens = tokenize("LAST_N_DAYS:7").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LastNDays);
        assert_eq!(tokens[1].kind, TokenKind::Colon);
        assert!(matches!(tokens[2].kind, TokenKind::UnsignedInteger(7)));
    }

    #[test]
    fn test_currency_prefixed_literal() {
        let tokens = tokenize("USD100").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::CurrencyPrefixedInteger((ref code, 100)) if code == "USD"));
    }

    #[test]
    fn test_bind_variable_tokens() {
        let tokens = tokenize(":myVar").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Colon);
        assert!(matches!(&tokens[1].kind, TokenKind::Identifier(s) if s == "myVar"));
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = tokenize("SELECT /* c */ Id // trailing\nFROM Account").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Select);
        assert!(matches!(&tokens[1].kind, TokenKind::Identifier(s) if s == "Id"));
        assert_eq!(tokens[2].kind, TokenKind::From);
    }
}
