//! A parser and AST builder for SOQL (Salesforce Object Query Language).
//!
//! ```
//! use soql_parser::{parse_query, ParseOptions};
//!
//! let query = parse_query("SELECT Id, Name FROM Account WHERE Name = 'Acme'", ParseOptions::default())
//!     .expect("valid SOQL");
//! assert_eq!(query.s_object, "Account");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use error::{ParseError, ParseResult, SoqlError};
pub use lexer::{tokenize, Lexer, Span, Token, TokenKind};
pub use parser::Parser;

/// Options controlling how [`parse_query`] and [`is_query_valid`] behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// When `true`, a lex or syntax error does not abort parsing:
    /// `parse_query` returns the best-effort AST built around the problem
    /// instead of raising [`SoqlError::Lex`] or [`SoqlError::Syntax`].
    pub continue_if_errors: bool,
    /// When `true`, any recorded syntax errors are written to stderr as
    /// they're returned, in addition to being surfaced on the error value.
    pub logging: bool,
    /// Whether a nested relationship query is represented inline as a
    /// `FieldSubquery` in `fields` (the only representation this crate's
    /// data model supports — see `DESIGN.md`).
    pub include_subquery_as_field: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            continue_if_errors: false,
            logging: false,
            include_subquery_as_field: true,
        }
    }
}

/// Parses a single SOQL query into its typed AST.
///
/// With `continue_if_errors: false` (the default), any syntax error raises
/// [`SoqlError::Syntax`] and any lex error raises [`SoqlError::Lex`]. With
/// `continue_if_errors: true`, both lex and syntax errors are swallowed into
/// the returned AST on a best-effort basis.
pub fn parse_query(text: &str, options: ParseOptions) -> Result<Query, SoqlError> {
    let mut parser = Parser::new(text);
    let query = parser.parse_query();
    if let Some(span) = parser.lex_error() {
        if !options.continue_if_errors {
            return Err(SoqlError::Lex(span));
        }
    }
    let errors = parser.into_errors();
    if !errors.is_empty() {
        if options.logging {
            for error in &errors {
                eprintln!("soql-parser: {error}");
            }
        }
        if !options.continue_if_errors {
            return Err(SoqlError::Syntax(errors));
        }
    }
    Ok(query)
}

/// `true` iff `parse_query(text, options)` with `continue_if_errors: false`
/// would not raise — a pure validity check that never allocates an AST.
pub fn is_query_valid(text: &str, options: ParseOptions) -> bool {
    let _ = options;
    let mut parser = Parser::new(text);
    parser.check_validity()
}
