//! Error taxonomy for the SOQL parser: lex errors, syntax errors (one per
//! rule violation, accumulated across the whole parse), and semantic-shape
//! errors raised by the AST builder when the CST is grammar-legal but
//! structurally impossible.

use crate::lexer::Span;
use thiserror::Error;

/// A single parse-time failure. The parser accumulates these into a list
/// rather than stopping at the first one, so a caller with
/// `continue_if_errors: true` can see every problem in one pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found} at {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("parenthesis groups do not balance in {clause} clause")]
    UnbalancedParens { clause: &'static str },
    #[error("TYPEOF {field} has no WHEN branch")]
    TypeofMissingWhen { field: String },
    #[error("ELSE must be the last branch of TYPEOF {field}")]
    TypeofElseNotLast { field: String },
    #[error("nesting depth exceeded maximum of {max} at {span:?}")]
    NestingTooDeep { max: u32, span: Span },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Top-level error returned by [`crate::parse_query`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SoqlError {
    #[error("lexical error at byte {}..{}", .0.start, .0.end)]
    Lex(Span),
    #[error("syntax error: {} problem(s) found", .0.len())]
    Syntax(Vec<ParseError>),
    #[error("internal error: {0}")]
    SemanticShape(String),
}

impl SoqlError {
    /// The individual syntax errors, if this is a `Syntax` variant.
    pub fn syntax_errors(&self) -> &[ParseError] {
        match self {
            SoqlError::Syntax(errors) => errors,
            _ => &[],
        }
    }
}
