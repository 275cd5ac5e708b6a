//! Recursive-descent parser and AST builder for SOQL.
//!
//! Grammar recognition and AST construction happen in the same pass: each
//! `parse_*` method both consumes tokens and returns the typed node it
//! describes, rather than building an intermediate concrete syntax tree.
//! Errors are accumulated rather than raised eagerly where the grammar
//! allows local recovery (comma-separated lists resynchronize on the next
//! comma or clause keyword), so a caller with `continue_if_errors: true`
//! can see more than the first problem in one pass.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{Lexer, Span, Token, TokenKind};

type ParseResult<T> = Result<T, ParseError>;

const MAX_NESTING_DEPTH: u32 = 64;

/// Intermediate result of parsing a `SELECT ... FROM ...` core, shared by
/// top-level queries and subqueries (which differ only in a few trailing
/// fields).
struct ParsedSelect {
    fields: Vec<FieldType>,
    target_prefix: Vec<String>,
    target_name: String,
    target_alias: Option<String>,
    using_scope: Option<UsingScope>,
    where_: Option<Condition>,
    with_security_enforced: Option<bool>,
    with_data_category: Option<WithDataCategory>,
    group_by: Option<GroupByClause>,
    order_by: Vec<OrderByClause>,
    limit: Option<u64>,
    offset: Option<u64>,
    for_: Option<ForClause>,
    update: Option<UpdateClause>,
}

pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    current: Token,
    errors: Vec<ParseError>,
    lex_error: Option<Span>,
    depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let (current, lex_error) = match lexer.next_token() {
            Ok(token) => (token, None),
            Err(span) => (Token::new(TokenKind::Eof, span), Some(span)),
        };
        Self {
            source,
            lexer,
            current,
            errors: Vec::new(),
            lex_error,
            depth: 0,
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    pub fn lex_error(&self) -> Option<Span> {
        self.lex_error
    }

    /// Parses a top-level query, always returning a value. On a structural
    /// failure (no sensible `Query` can be built) the error is recorded and
    /// a placeholder query is returned so `continue_if_errors` callers get
    /// something back rather than nothing.
    pub fn parse_query(&mut self) -> Query {
        match self.parse_query_core() {
            Ok(query) => {
                self.expect_end();
                query
            }
            Err(e) => {
                self.errors.push(e);
                Query {
                    fields: Vec::new(),
                    s_object: String::new(),
                    s_object_alias: None,
                    s_object_prefix: None,
                    using_scope: None,
                    r#where: None,
                    with_security_enforced: None,
                    with_data_category: None,
                    group_by: None,
                    order_by: Vec::new(),
                    limit: None,
                    offset: None,
                    r#for: None,
                    update: None,
                }
            }
        }
    }

    /// Runs the same grammar as [`Self::parse_query`] but only to determine
    /// validity, short-circuiting on the first lex or syntax problem.
    pub fn check_validity(&mut self) -> bool {
        if self.lex_error.is_some() {
            return false;
        }
        match self.parse_query_core() {
            Ok(_) => {
                self.expect_end();
                self.errors.is_empty() && self.lex_error.is_none()
            }
            Err(e) => {
                self.errors.push(e);
                false
            }
        }
    }

    fn expect_end(&mut self) {
        if !self.is_at_end() {
            self.record(ParseError::UnexpectedToken {
                expected: "end of input".into(),
                found: self.current.kind.to_string(),
                span: self.current_span(),
            });
        }
    }

    // ---- token-stream helpers ----

    fn advance(&mut self) -> Token {
        let next = match self.lexer.next_token() {
            Ok(token) => token,
            Err(span) => {
                if self.lex_error.is_none() {
                    self.lex_error = Some(span);
                }
                Token::new(TokenKind::Eof, span)
            }
        };
        std::mem::replace(&mut self.current, next)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn current_span(&self) -> Span {
        self.current.span
    }

    fn text(&self, span: Span) -> &'a str {
        self.source.get(span.start..span.end).unwrap_or_default()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else if self.is_at_end() {
            Err(ParseError::UnexpectedEof {
                expected: expected.into(),
            })
        } else {
            Err(ParseError::UnexpectedToken {
                expected: expected.into(),
                found: self.current.kind.to_string(),
                span: self.current_span(),
            })
        }
    }

    fn consume_unsigned_integer(&mut self) -> ParseResult<Token> {
        if matches!(self.current.kind, TokenKind::UnsignedInteger(_)) {
            Ok(self.advance())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "integer".into(),
                found: self.current.kind.to_string(),
                span: self.current_span(),
            })
        }
    }

    fn record(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    fn enter_nesting(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
                span: self.current_span(),
            });
        }
        Ok(())
    }

    fn leave_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Any token that can stand in for a bare identifier outside of a
    /// structural keyword position: SOQL's keyword list overlaps heavily
    /// with legal standard field/object names (`Group`, `Type`, `Order` as
    /// a custom object, the aggregate function names used as plain
    /// columns, ...).
    fn identifier_like_text(&self) -> Option<String> {
        match &self.current.kind {
            TokenKind::Identifier(s) => Some(s.clone()),
            TokenKind::LParen
            | TokenKind::RParen
            | TokenKind::Comma
            | TokenKind::Colon
            | TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::LtGt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::StringLiteral(_)
            | TokenKind::UnsignedInteger(_)
            | TokenKind::SignedInteger(_)
            | TokenKind::UnsignedReal(_)
            | TokenKind::SignedReal(_)
            | TokenKind::Date(_)
            | TokenKind::DateTime(_)
            | TokenKind::CurrencyPrefixedInteger(_)
            | TokenKind::CurrencyPrefixedDecimal(_)
            | TokenKind::Select
            | TokenKind::From
            | TokenKind::Where
            | TokenKind::And
            | TokenKind::Or
            | TokenKind::Not
            | TokenKind::Like
            | TokenKind::In
            | TokenKind::Includes
            | TokenKind::Excludes
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::Eof => None,
            _ => Some(self.text(self.current.span).to_string()),
        }
    }

    fn parse_name(&mut self) -> ParseResult<String> {
        match self.identifier_like_text() {
            Some(text) => {
                self.advance();
                Ok(text)
            }
            None if self.is_at_end() => Err(ParseError::UnexpectedEof {
                expected: "identifier".into(),
            }),
            None => Err(ParseError::UnexpectedToken {
                expected: "identifier".into(),
                found: self.current.kind.to_string(),
                span: self.current_span(),
            }),
        }
    }

    fn is_alias_boundary(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Comma
                | TokenKind::RParen
                | TokenKind::From
                | TokenKind::Where
                | TokenKind::With
                | TokenKind::Group
                | TokenKind::Having
                | TokenKind::Order
                | TokenKind::Limit
                | TokenKind::Offset
                | TokenKind::For
                | TokenKind::Update
                | TokenKind::Using
                | TokenKind::Eof
        )
    }

    fn parse_optional_alias(&mut self) -> ParseResult<Option<String>> {
        if self.is_alias_boundary() {
            return Ok(None);
        }
        let text = match self.identifier_like_text() {
            Some(text) => text,
            None => return Ok(None),
        };
        self.advance();
        if text.eq_ignore_ascii_case("as") && !self.is_alias_boundary() {
            if let Some(real_alias) = self.identifier_like_text() {
                self.advance();
                return Ok(Some(real_alias));
            }
            return Ok(None);
        }
        Ok(Some(text))
    }

    /// `true` when the current token both names a function and is actually
    /// followed by `(` — otherwise it's a bare field/alias that happens to
    /// share spelling with a function keyword.
    fn at_function_call(&mut self) -> bool {
        if !is_function_token(&self.current.kind) {
            return false;
        }
        matches!(self.lexer.peek(), Ok(t) if t.kind == TokenKind::LParen)
    }

    // ---- top-level / subquery entry points ----

    fn parse_query_core(&mut self) -> ParseResult<Query> {
        let parsed = self.parse_select_core(false)?;
        Ok(Query {
            fields: parsed.fields,
            s_object: parsed.target_name,
            s_object_alias: parsed.target_alias,
            s_object_prefix: non_empty(parsed.target_prefix),
            using_scope: parsed.using_scope,
            r#where: parsed.where_,
            with_security_enforced: parsed.with_security_enforced,
            with_data_category: parsed.with_data_category,
            group_by: parsed.group_by,
            order_by: parsed.order_by,
            limit: parsed.limit,
            offset: parsed.offset,
            r#for: parsed.for_,
            update: parsed.update,
        })
    }

    fn parse_subquery(&mut self) -> ParseResult<Subquery> {
        let parsed = self.parse_select_core(true)?;
        Ok(Subquery {
            fields: parsed.fields,
            relationship_name: parsed.target_name,
            s_object_prefix: non_empty(parsed.target_prefix),
            s_object_alias: parsed.target_alias,
            r#where: parsed.where_,
            with_security_enforced: parsed.with_security_enforced,
            with_data_category: parsed.with_data_category,
            group_by: parsed.group_by,
            order_by: parsed.order_by,
            limit: parsed.limit,
            offset: parsed.offset,
            r#for: parsed.for_,
            update: parsed.update,
        })
    }

    fn parse_select_core(&mut self, is_subquery: bool) -> ParseResult<ParsedSelect> {
        self.consume(&TokenKind::Select, "SELECT")?;
        let mut fields = self.parse_select_field_list()?;
        self.consume(&TokenKind::From, "FROM")?;
        let (target_prefix, target_name) = split_dotted(&self.parse_name()?);
        let target_alias = self.parse_optional_alias()?;
        resolve_aliases(&mut fields, target_alias.as_deref());

        let using_scope = if is_subquery {
            None
        } else {
            self.parse_using_scope()?
        };
        let where_ = if self.match_token(&TokenKind::Where) {
            Some(self.parse_condition_chain("WHERE")?)
        } else {
            None
        };
        let (with_security_enforced, with_data_category) = self.parse_with_clauses()?;
        let group_by = self.parse_group_by_clause()?;
        let order_by = self.parse_order_by_clause()?;
        let limit = self.parse_limit()?;
        let offset = self.parse_offset()?;
        let for_ = self.parse_for_clause()?;
        let update = self.parse_update_clause()?;

        Ok(ParsedSelect {
            fields,
            target_prefix,
            target_name,
            target_alias,
            using_scope,
            where_,
            with_security_enforced,
            with_data_category,
            group_by,
            order_by,
            limit,
            offset,
            for_,
            update,
        })
    }

    // ---- select field list ----

    fn parse_select_field_list(&mut self) -> ParseResult<Vec<FieldType>> {
        let mut fields = Vec::new();
        loop {
            match self.parse_select_field() {
                Ok(field) => fields.push(field),
                Err(e) => {
                    self.record(e);
                    self.resync_to(&[TokenKind::Comma, TokenKind::From]);
                }
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(fields)
    }

    /// Skips tokens until one of `boundaries` (or `FROM`/EOF) is current,
    /// used to resynchronize after a malformed list item.
    fn resync_to(&mut self, boundaries: &[TokenKind]) {
        while !self.is_at_end()
            && !boundaries
                .iter()
                .any(|b| std::mem::discriminant(b) == std::mem::discriminant(&self.current.kind))
        {
            self.advance();
        }
    }

    fn parse_select_field(&mut self) -> ParseResult<FieldType> {
        if self.check(&TokenKind::LParen) {
            return self.parse_subquery_field();
        }
        if self.check(&TokenKind::Typeof) {
            return Ok(FieldType::FieldTypeof(self.parse_typeof_clause()?));
        }
        if self.at_function_call() {
            let mut func = self.parse_function_call(true)?;
            func.alias = self.parse_optional_alias()?;
            return Ok(FieldType::FieldFunctionExpression(func));
        }
        let raw = self.parse_name()?;
        let alias = self.parse_optional_alias()?;
        Ok(make_field_node(raw, alias))
    }

    fn parse_subquery_field(&mut self) -> ParseResult<FieldType> {
        self.consume(&TokenKind::LParen, "(")?;
        self.enter_nesting()?;
        let subquery = self.parse_subquery();
        self.leave_nesting();
        let subquery = subquery?;
        self.consume(&TokenKind::RParen, ")")?;
        Ok(FieldType::FieldSubquery(FieldSubquery { subquery }))
    }

    fn parse_typeof_clause(&mut self) -> ParseResult<FieldTypeof> {
        self.consume(&TokenKind::Typeof, "TYPEOF")?;
        let field = self.parse_name()?;
        let mut conditions = Vec::new();
        let mut has_when = false;
        let mut has_else = false;
        loop {
            if self.match_token(&TokenKind::When) {
                if has_else {
                    self.record(ParseError::TypeofElseNotLast {
                        field: field.clone(),
                    });
                }
                has_when = true;
                let object_type = self.parse_name()?;
                self.consume(&TokenKind::Then, "THEN")?;
                let field_list = self.parse_typeof_field_list()?;
                conditions.push(TypeofCondition::When {
                    object_type,
                    field_list,
                });
            } else if self.match_token(&TokenKind::Else) {
                if has_else {
                    self.record(ParseError::TypeofElseNotLast {
                        field: field.clone(),
                    });
                }
                has_else = true;
                let field_list = self.parse_typeof_field_list()?;
                conditions.push(TypeofCondition::Else { field_list });
            } else {
                break;
            }
        }
        self.consume(&TokenKind::End, "END")?;
        if !has_when {
            self.record(ParseError::TypeofMissingWhen {
                field: field.clone(),
            });
        }
        Ok(FieldTypeof { field, conditions })
    }

    fn parse_typeof_field_list(&mut self) -> ParseResult<Vec<String>> {
        let mut fields = Vec::new();
        loop {
            fields.push(self.parse_name()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(fields)
    }

    // ---- function calls ----

    /// `include_type` mirrors the source helper's `includeType` flag: a
    /// function call sitting in a projection carries `isAggregateFn`, but
    /// the same call shape used in `GROUP BY`/`ORDER BY`/the LHS of a
    /// condition omits it. Nested parameter calls inherit their enclosing
    /// call's flag.
    fn parse_function_call(&mut self, include_type: bool) -> ParseResult<FieldFunctionExpression> {
        let start = self.current_span();
        let name = function_name_for(&self.current.kind).ok_or_else(|| ParseError::UnexpectedToken {
            expected: "function name".into(),
            found: self.current.kind.to_string(),
            span: start,
        })?;
        self.advance();
        self.consume(&TokenKind::LParen, "(")?;
        let parameters = self.parse_function_parameters(include_type)?;
        let end_tok = self.consume(&TokenKind::RParen, ")")?;
        let raw_value = self.text(start.merge(end_tok.span)).to_string();
        let is_aggregate_fn = if include_type && is_aggregate_function(&name) {
            Some(true)
        } else {
            None
        };
        Ok(FieldFunctionExpression {
            function_name: name,
            parameters,
            is_aggregate_fn,
            alias: None,
            raw_value,
        })
    }

    fn parse_function_parameters(&mut self, include_type: bool) -> ParseResult<Vec<FunctionParameter>> {
        let mut params = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            params.push(self.parse_function_parameter(include_type)?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_function_parameter(&mut self, include_type: bool) -> ParseResult<FunctionParameter> {
        if self.at_function_call() {
            return Ok(FunctionParameter::Function(Box::new(
                self.parse_function_call(include_type)?,
            )));
        }
        if let Some(text) = self.identifier_like_text() {
            self.advance();
            return Ok(FunctionParameter::Value(text));
        }
        let tok = self.current.clone();
        if matches!(
            tok.kind,
            TokenKind::StringLiteral(_)
                | TokenKind::UnsignedInteger(_)
                | TokenKind::SignedInteger(_)
                | TokenKind::UnsignedReal(_)
                | TokenKind::SignedReal(_)
                | TokenKind::Date(_)
                | TokenKind::DateTime(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        ) {
            self.advance();
            return Ok(FunctionParameter::Value(self.text(tok.span).to_string()));
        }
        Err(ParseError::UnexpectedToken {
            expected: "function argument".into(),
            found: tok.kind.to_string(),
            span: tok.span,
        })
    }

    // ---- WHERE / HAVING condition chains ----

    fn parse_condition_chain(&mut self, clause: &'static str) -> ParseResult<Condition> {
        let mut nodes = Vec::new();
        let mut connectives = Vec::new();
        let mut total_open = 0u32;
        let mut total_close = 0u32;
        loop {
            let cond = self.parse_condition_expression()?;
            total_open += cond.open_paren;
            total_close += cond.close_paren;
            nodes.push(cond);
            if self.match_token(&TokenKind::And) {
                connectives.push(LogicalOperator::And);
            } else if self.match_token(&TokenKind::Or) {
                connectives.push(LogicalOperator::Or);
            } else {
                break;
            }
        }
        if total_open != total_close {
            self.record(ParseError::UnbalancedParens { clause });
        }
        let mut acc = nodes.pop().expect("parse_condition_expression always yields a node");
        while let Some(mut prev) = nodes.pop() {
            let op = connectives.pop().expect("one connective between each pair of nodes");
            prev.logical_operator = Some(op);
            prev.right = Some(Box::new(acc));
            acc = prev;
        }
        Ok(acc)
    }

    fn parse_condition_expression(&mut self) -> ParseResult<Condition> {
        let logical_prefix = if self.match_token(&TokenKind::Not) {
            Some(LogicalPrefix::Not)
        } else {
            None
        };
        let mut open_paren = 0u32;
        while self.match_token(&TokenKind::LParen) {
            open_paren += 1;
        }
        let mut cond = self.parse_expression()?;
        cond.logical_prefix = logical_prefix;
        cond.open_paren = open_paren;
        let mut close_paren = 0u32;
        while self.match_token(&TokenKind::RParen) {
            close_paren += 1;
        }
        cond.close_paren = close_paren;
        Ok(cond)
    }

    fn parse_expression(&mut self) -> ParseResult<Condition> {
        let (field, fn_) = if self.at_function_call() {
            (None, Some(self.parse_function_call(false)?))
        } else {
            (Some(self.parse_name()?), None)
        };
        let operator = self.parse_relational_operator()?;
        let (value, value_query, literal_type, date_literal_variable) =
            self.parse_condition_rhs()?;
        Ok(Condition {
            field,
            fn_,
            operator,
            value,
            value_query,
            literal_type,
            date_literal_variable,
            logical_prefix: None,
            open_paren: 0,
            close_paren: 0,
            logical_operator: None,
            right: None,
        })
    }

    fn parse_relational_operator(&mut self) -> ParseResult<RelationalOperator> {
        if self.match_token(&TokenKind::Eq) {
            return Ok(RelationalOperator::Equal);
        }
        if self.match_token(&TokenKind::NotEq) || self.match_token(&TokenKind::LtGt) {
            return Ok(RelationalOperator::NotEqual);
        }
        if self.match_token(&TokenKind::LtEq) {
            return Ok(RelationalOperator::LessOrEqual);
        }
        if self.match_token(&TokenKind::GtEq) {
            return Ok(RelationalOperator::GreaterOrEqual);
        }
        if self.match_token(&TokenKind::Lt) {
            return Ok(RelationalOperator::LessThan);
        }
        if self.match_token(&TokenKind::Gt) {
            return Ok(RelationalOperator::GreaterThan);
        }
        if self.match_token(&TokenKind::Like) {
            return Ok(RelationalOperator::Like);
        }
        if self.match_token(&TokenKind::Includes) {
            return Ok(RelationalOperator::Includes);
        }
        if self.match_token(&TokenKind::Excludes) {
            return Ok(RelationalOperator::Excludes);
        }
        if self.match_token(&TokenKind::Not) {
            self.consume(&TokenKind::In, "IN")?;
            return Ok(RelationalOperator::NotIn);
        }
        if self.match_token(&TokenKind::In) {
            return Ok(RelationalOperator::In);
        }
        Err(ParseError::UnexpectedToken {
            expected: "comparison operator".into(),
            found: self.current.kind.to_string(),
            span: self.current_span(),
        })
    }

    #[allow(clippy::type_complexity)]
    fn parse_condition_rhs(
        &mut self,
    ) -> ParseResult<(
        Option<String>,
        Option<Box<Subquery>>,
        Option<LiteralTypeTag>,
        Option<DateLiteralVariable>,
    )> {
        if self.check(&TokenKind::Colon) {
            let (text, lit, _) = self.parse_literal_atom()?;
            return Ok((Some(text), None, Some(LiteralTypeTag::Scalar(lit)), None));
        }
        if self.check(&TokenKind::LParen) {
            self.advance();
            if self.check(&TokenKind::Select) {
                self.enter_nesting()?;
                let sub = self.parse_subquery();
                self.leave_nesting();
                let sub = sub?;
                self.consume(&TokenKind::RParen, ")")?;
                return Ok((
                    None,
                    Some(Box::new(sub)),
                    Some(LiteralTypeTag::Scalar(LiteralType::Subquery)),
                    None,
                ));
            }
            let mut values = Vec::new();
            let mut types = Vec::new();
            let mut date_vars = Vec::new();
            loop {
                let (text, lit_type, date_var) = self.parse_literal_atom()?;
                values.push(text);
                types.push(lit_type);
                date_vars.push(date_var);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.consume(&TokenKind::RParen, ")")?;
            let value = format!("({})", values.join(", "));
            let literal_type = if types.iter().all(|t| *t == types[0]) {
                LiteralTypeTag::Scalar(types[0])
            } else {
                LiteralTypeTag::Array(types)
            };
            let date_literal_variable = if date_vars.iter().any(Option::is_some) {
                Some(DateLiteralVariable::PerElement(date_vars))
            } else {
                None
            };
            return Ok((Some(value), None, Some(literal_type), date_literal_variable));
        }
        let (text, lit_type, date_var) = self.parse_literal_atom()?;
        let date_literal_variable = date_var.map(DateLiteralVariable::Single);
        Ok((
            Some(text),
            None,
            Some(LiteralTypeTag::Scalar(lit_type)),
            date_literal_variable,
        ))
    }

    fn parse_literal_atom(&mut self) -> ParseResult<(String, LiteralType, Option<i64>)> {
        if self.match_token(&TokenKind::Colon) {
            let name = self.parse_name()?;
            return Ok((format!(":{}", name), LiteralType::ApexBindVariable, None));
        }
        let tok = self.current.clone();
        if is_date_n_literal_token(&tok.kind) {
            self.advance();
            self.consume(&TokenKind::Colon, ":")?;
            let n_tok = self.consume_unsigned_integer()?;
            let n = match n_tok.kind {
                TokenKind::UnsignedInteger(v) => v as i64,
                _ => unreachable!(),
            };
            let text = self.text(tok.span.merge(n_tok.span)).to_string();
            return Ok((text, LiteralType::DateNLiteral, Some(n)));
        }
        let lit_type = match &tok.kind {
            TokenKind::StringLiteral(_) => Some(LiteralType::String),
            TokenKind::True | TokenKind::False => Some(LiteralType::Boolean),
            TokenKind::Null => Some(LiteralType::Null),
            TokenKind::DateTime(_) => Some(LiteralType::DateTime),
            TokenKind::Date(_) => Some(LiteralType::Date),
            TokenKind::UnsignedInteger(_) | TokenKind::SignedInteger(_) => Some(LiteralType::Integer),
            TokenKind::UnsignedReal(_) | TokenKind::SignedReal(_) => Some(LiteralType::Decimal),
            TokenKind::CurrencyPrefixedInteger(_) => Some(LiteralType::IntegerWithCurrencyPrefix),
            TokenKind::CurrencyPrefixedDecimal(_) => Some(LiteralType::DecimalWithCurrencyPrefix),
            k if is_date_literal_token(k) => Some(LiteralType::DateLiteral),
            _ => None,
        };
        match lit_type {
            Some(lit) => {
                self.advance();
                Ok((self.text(tok.span).to_string(), lit, None))
            }
            None => Err(ParseError::UnexpectedToken {
                expected: "literal value".into(),
                found: tok.kind.to_string(),
                span: tok.span,
            }),
        }
    }

    // ---- USING SCOPE / WITH ----

    fn parse_using_scope(&mut self) -> ParseResult<Option<UsingScope>> {
        if !self.match_token(&TokenKind::Using) {
            return Ok(None);
        }
        self.consume(&TokenKind::Scope, "SCOPE")?;
        let word = self.parse_name()?;
        match UsingScope::from_keyword(&word) {
            Some(scope) => Ok(Some(scope)),
            None => {
                self.record(ParseError::UnexpectedToken {
                    expected: "using scope keyword".into(),
                    found: word,
                    span: self.current_span(),
                });
                Ok(None)
            }
        }
    }

    fn parse_with_clauses(&mut self) -> ParseResult<(Option<bool>, Option<WithDataCategory>)> {
        let mut with_security_enforced = None;
        let mut conditions = Vec::new();
        while self.match_token(&TokenKind::With) {
            if self.match_token(&TokenKind::SecurityEnforced) {
                with_security_enforced = Some(true);
                continue;
            }
            self.consume(&TokenKind::Data, "DATA")?;
            self.consume(&TokenKind::Category, "CATEGORY")?;
            loop {
                conditions.push(self.parse_with_data_category_condition()?);
                if !self.match_token(&TokenKind::And) {
                    break;
                }
            }
        }
        let with_data_category = if conditions.is_empty() {
            None
        } else {
            Some(WithDataCategory { conditions })
        };
        Ok((with_security_enforced, with_data_category))
    }

    fn parse_with_data_category_condition(&mut self) -> ParseResult<WithDataCategoryCondition> {
        let group_name = self.parse_name()?;
        let selector = if self.match_token(&TokenKind::AboveOrBelow) {
            DataCategorySelector::AboveOrBelow
        } else if self.match_token(&TokenKind::At) {
            DataCategorySelector::At
        } else if self.match_token(&TokenKind::Above) {
            DataCategorySelector::Above
        } else if self.match_token(&TokenKind::Below) {
            DataCategorySelector::Below
        } else {
            return Err(ParseError::UnexpectedToken {
                expected: "AT, ABOVE, BELOW or ABOVE_OR_BELOW".into(),
                found: self.current.kind.to_string(),
                span: self.current_span(),
            });
        };
        let has_parens = self.match_token(&TokenKind::LParen);
        let mut parameters = Vec::new();
        loop {
            parameters.push(self.parse_name()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        if has_parens {
            self.consume(&TokenKind::RParen, ")")?;
        }
        Ok(WithDataCategoryCondition {
            group_name,
            selector,
            parameters,
        })
    }

    // ---- GROUP BY / ORDER BY / LIMIT / OFFSET / FOR / UPDATE ----

    fn parse_group_by_clause(&mut self) -> ParseResult<Option<GroupByClause>> {
        if !self.match_token(&TokenKind::Group) {
            return Ok(None);
        }
        self.consume(&TokenKind::By, "BY")?;
        let (field, fn_) = if self.at_function_call() {
            (None, Some(self.parse_function_call(false)?))
        } else {
            let mut fields = Vec::new();
            loop {
                fields.push(self.parse_name()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            let field = if fields.len() == 1 {
                GroupByField::Single(fields.into_iter().next().unwrap())
            } else {
                GroupByField::Many(fields)
            };
            (Some(field), None)
        };
        let having = if self.match_token(&TokenKind::Having) {
            Some(self.parse_condition_chain("HAVING")?)
        } else {
            None
        };
        Ok(Some(GroupByClause { field, fn_, having }))
    }

    fn parse_order_by_clause(&mut self) -> ParseResult<Vec<OrderByClause>> {
        if !self.match_token(&TokenKind::Order) {
            return Ok(Vec::new());
        }
        self.consume(&TokenKind::By, "BY")?;
        let mut items = Vec::new();
        loop {
            let (field, fn_) = if self.at_function_call() {
                (None, Some(self.parse_function_call(false)?))
            } else {
                (Some(self.parse_name()?), None)
            };
            let order = if self.match_token(&TokenKind::Asc) {
                Some(OrderDirection::Asc)
            } else if self.match_token(&TokenKind::Desc) {
                Some(OrderDirection::Desc)
            } else {
                None
            };
            let nulls = if self.match_token(&TokenKind::Nulls) {
                if self.match_token(&TokenKind::First) {
                    Some(NullsOrder::First)
                } else if self.match_token(&TokenKind::Last) {
                    Some(NullsOrder::Last)
                } else {
                    return Err(ParseError::UnexpectedToken {
                        expected: "FIRST or LAST".into(),
                        found: self.current.kind.to_string(),
                        span: self.current_span(),
                    });
                }
            } else {
                None
            };
            items.push(OrderByClause {
                field,
                fn_,
                order,
                nulls,
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_limit(&mut self) -> ParseResult<Option<u64>> {
        if !self.match_token(&TokenKind::Limit) {
            return Ok(None);
        }
        let tok = self.consume_unsigned_integer()?;
        match tok.kind {
            TokenKind::UnsignedInteger(n) => Ok(Some(n)),
            _ => unreachable!(),
        }
    }

    fn parse_offset(&mut self) -> ParseResult<Option<u64>> {
        if !self.match_token(&TokenKind::Offset) {
            return Ok(None);
        }
        let tok = self.consume_unsigned_integer()?;
        match tok.kind {
            TokenKind::UnsignedInteger(n) => Ok(Some(n)),
            _ => unreachable!(),
        }
    }

    fn parse_for_clause(&mut self) -> ParseResult<Option<ForClause>> {
        if !self.match_token(&TokenKind::For) {
            return Ok(None);
        }
        if self.match_token(&TokenKind::View) {
            return Ok(Some(ForClause::View));
        }
        if self.match_token(&TokenKind::Reference) {
            return Ok(Some(ForClause::Reference));
        }
        Err(ParseError::UnexpectedToken {
            expected: "VIEW or REFERENCE".into(),
            found: self.current.kind.to_string(),
            span: self.current_span(),
        })
    }

    fn parse_update_clause(&mut self) -> ParseResult<Option<UpdateClause>> {
        if !self.match_token(&TokenKind::Update) {
            return Ok(None);
        }
        if self.match_token(&TokenKind::Tracking) {
            return Ok(Some(UpdateClause::Tracking));
        }
        if self.match_token(&TokenKind::Viewstat) {
            return Ok(Some(UpdateClause::Viewstat));
        }
        Err(ParseError::UnexpectedToken {
            expected: "TRACKING or VIEWSTAT".into(),
            found: self.current.kind.to_string(),
            span: self.current_span(),
        })
    }
}

fn non_empty(segments: Vec<String>) -> Option<Vec<String>> {
    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

/// Splits a dotted path into its leading relationship segments and its
/// final field/object name (`Account.Owner.Name` -> `(["Account", "Owner"],
/// "Name")`).
fn split_dotted(raw: &str) -> (Vec<String>, String) {
    let mut parts: Vec<String> = raw.split('.').map(|s| s.to_string()).collect();
    let field = parts.pop().unwrap_or_default();
    (parts, field)
}

fn make_field_node(raw: String, alias: Option<String>) -> FieldType {
    let (relationships, field) = split_dotted(&raw);
    if relationships.is_empty() {
        FieldType::Field(Field {
            field,
            object_prefix: None,
            alias,
        })
    } else {
        FieldType::FieldRelationship(FieldRelationship {
            field,
            relationships,
            object_prefix: None,
            alias,
            raw_value: raw,
        })
    }
}

/// Reconciles a leading relationship segment against the FROM alias: once
/// the alias is known, `alias.Field` is really just `Field` on the root
/// object, not a genuine relationship traversal.
fn resolve_aliases(fields: &mut [FieldType], alias: Option<&str>) {
    let Some(alias) = alias else { return };
    for field in fields.iter_mut() {
        if let FieldType::FieldRelationship(fr) = field {
            if fr
                .relationships
                .first()
                .is_some_and(|head| head.eq_ignore_ascii_case(alias))
            {
                let object_prefix = fr.relationships.remove(0);
                if fr.relationships.is_empty() {
                    *field = FieldType::Field(Field {
                        field: fr.field.clone(),
                        object_prefix: Some(object_prefix),
                        alias: fr.alias.clone(),
                    });
                } else {
                    fr.object_prefix = Some(object_prefix);
                }
            }
        }
    }
}

fn is_function_token(kind: &TokenKind) -> bool {
    function_name_for(kind).is_some()
}

fn function_name_for(kind: &TokenKind) -> Option<String> {
    let name = match kind {
        TokenKind::CountDistinct => "COUNT_DISTINCT",
        TokenKind::Count => "COUNT",
        TokenKind::Sum => "SUM",
        TokenKind::Avg => "AVG",
        TokenKind::Min => "MIN",
        TokenKind::Max => "MAX",
        TokenKind::CalendarMonth => "CALENDAR_MONTH",
        TokenKind::CalendarQuarter => "CALENDAR_QUARTER",
        TokenKind::CalendarYear => "CALENDAR_YEAR",
        TokenKind::DayInMonth => "DAY_IN_MONTH",
        TokenKind::DayInWeek => "DAY_IN_WEEK",
        TokenKind::DayInYear => "DAY_IN_YEAR",
        TokenKind::DayOnly => "DAY_ONLY",
        TokenKind::FiscalMonth => "FISCAL_MONTH",
        TokenKind::FiscalQuarter => "FISCAL_QUARTER",
        TokenKind::FiscalYear => "FISCAL_YEAR",
        TokenKind::HourInDay => "HOUR_IN_DAY",
        TokenKind::WeekInMonth => "WEEK_IN_MONTH",
        TokenKind::WeekInYear => "WEEK_IN_YEAR",
        TokenKind::Cube => "CUBE",
        TokenKind::Rollup => "ROLLUP",
        TokenKind::Grouping => "GROUPING",
        TokenKind::Format => "FORMAT",
        TokenKind::ConvertCurrency => "CONVERT_CURRENCY",
        TokenKind::ToLabel => "TOLABEL",
        TokenKind::Distance => "DISTANCE",
        TokenKind::Geolocation => "GEOLOCATION",
        _ => return None,
    };
    Some(name.to_string())
}

fn is_aggregate_function(name: &str) -> bool {
    matches!(
        name,
        "COUNT" | "COUNT_DISTINCT" | "SUM" | "AVG" | "MIN" | "MAX" | "DISTANCE"
    )
}

fn is_date_literal_token(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Yesterday
            | TokenKind::Today
            | TokenKind::Tomorrow
            | TokenKind::LastWeek
            | TokenKind::ThisWeek
            | TokenKind::NextWeek
            | TokenKind::LastMonth
            | TokenKind::ThisMonth
            | TokenKind::NextMonth
            | TokenKind::Last90Days
            | TokenKind::Next90Days
            | TokenKind::ThisQuarter
            | TokenKind::LastQuarter
            | TokenKind::NextQuarter
            | TokenKind::ThisYear
            | TokenKind::LastYear
            | TokenKind::NextYear
            | TokenKind::ThisFiscalQuarter
            | TokenKind::LastFiscalQuarter
            | TokenKind::NextFiscalQuarter
            | TokenKind::ThisFiscalYear
            | TokenKind::LastFiscalYear
            | TokenKind::NextFiscalYear
    )
}

fn is_date_n_literal_token(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::NextNDays
            | TokenKind::LastNDays
            | TokenKind::NDaysAgo
            | TokenKind::NextNWeeks
            | TokenKind::LastNWeeks
            | TokenKind::NWeeksAgo
            | TokenKind::NextNMonths
            | TokenKind::LastNMonths
            | TokenKind::NMonthsAgo
            | TokenKind::NextNQuarters
            | TokenKind::LastNQuarters
            | TokenKind::NQuartersAgo
            | TokenKind::NextNYears
            | TokenKind::LastNYears
            | TokenKind::NYearsAgo
            | TokenKind::NextNFiscalQuarters
            | TokenKind::LastNFiscalQuarters
            | TokenKind::NFiscalQuartersAgo
            | TokenKind::NextNFiscalYears
            | TokenKind::LastNFiscalYears
            | TokenKind::NFiscalYearsAgo
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Query {
        let mut parser = Parser::new(source);
        let query = parser.parse_query();
        assert!(parser.lex_error().is_none(), "unexpected lex error");
        assert!(
            parser.errors().is_empty(),
            "unexpected parse errors: {:?}",
            parser.errors()
        );
        query
    }

    #[test]
    fn test_simple_query() {
        let query = parse_ok("SELECT Id, Name FROM Account");
        assert_eq!(query.s_object, "Account");
        assert_eq!(query.fields.len(), 2);
        assert!(matches!(&query.fields[0], FieldType::Field(f) if f.field == "Id"));
    }

    #[test]
    fn test_relationship_field() {
        let query = parse_ok("SELECT Owner.Name FROM Account");
        match &query.fields[0] {
            FieldType::FieldRelationship(fr) => {
                assert_eq!(fr.relationships, vec!["Owner".to_string()]);
                assert_eq!(fr.field, "Name");
            }
            other => panic!("expected FieldRelationship, got {other:?}"),
        }
    }

    #[test]
    fn test_alias_reconciled_into_field() {
        let query = parse_ok("SELECT a.Name FROM Account a");
        assert_eq!(query.s_object_alias.as_deref(), Some("a"));
        match &query.fields[0] {
            FieldType::Field(f) => {
                assert_eq!(f.field, "Name");
                assert_eq!(f.object_prefix.as_deref(), Some("a"));
            }
            other => panic!("expected Field after alias reconciliation, got {other:?}"),
        }
    }

    #[test]
    fn test_where_chain_with_parens() {
        let query = parse_ok("SELECT Id FROM Account WHERE (Name = 'x' AND Id != null) OR Age > 5");
        let where_ = query.r#where.unwrap();
        assert_eq!(where_.open_paren, 1);
        assert_eq!(where_.logical_operator, Some(LogicalOperator::And));
        let right = where_.right.unwrap();
        assert_eq!(right.close_paren, 1);
        assert_eq!(right.logical_operator, Some(LogicalOperator::Or));
        let third = right.right.unwrap();
        assert_eq!(third.operator, RelationalOperator::GreaterThan);
    }

    #[test]
    fn test_subquery_field() {
        let query = parse_ok("SELECT Id, (SELECT Id FROM Contacts) FROM Account");
        match &query.fields[1] {
            FieldType::FieldSubquery(sq) => assert_eq!(sq.subquery.relationship_name, "Contacts"),
            other => panic!("expected FieldSubquery, got {other:?}"),
        }
    }

    #[test]
    fn test_in_subquery_value_query() {
        let query =
            parse_ok("SELECT Id FROM Account WHERE Id IN (SELECT AccountId FROM Contact)");
        let cond = query.r#where.unwrap();
        assert_eq!(cond.operator, RelationalOperator::In);
        assert!(cond.value_query.is_some());
    }

    #[test]
    fn test_aggregate_with_having() {
        let query = parse_ok(
            "SELECT Name, COUNT(Id) cnt FROM Account GROUP BY Name HAVING COUNT(Id) > 5",
        );
        match &query.fields[1] {
            FieldType::FieldFunctionExpression(f) => {
                assert_eq!(f.function_name, "COUNT");
                assert_eq!(f.alias.as_deref(), Some("cnt"));
                assert_eq!(f.is_aggregate_fn, Some(true));
            }
            other => panic!("expected FieldFunctionExpression, got {other:?}"),
        }
        let having = query.group_by.unwrap().having.unwrap();
        assert_eq!(having.operator, RelationalOperator::GreaterThan);
        // HAVING's LHS is not a projection, so isAggregateFn is omitted.
        assert_eq!(having.fn_.unwrap().is_aggregate_fn, None);
    }

    #[test]
    fn test_date_n_literal_in_where() {
        let query = parse_ok("SELECT Id FROM Account WHERE CreatedDate = LAST_N_DAYS:7");
        let cond = query.r#where.unwrap();
        assert_eq!(cond.value.as_deref(), Some("LAST_N_DAYS:7"));
        assert_eq!(cond.date_literal_variable, Some(DateLiteralVariable::Single(7)));
        assert_eq!(
            cond.literal_type,
            Some(LiteralTypeTag::Scalar(LiteralType::DateNLiteral))
        );
    }

    #[test]
    fn test_typeof_clause() {
        let query = parse_ok(
            "SELECT TYPEOF Owner WHEN User THEN Name WHEN Group THEN Email ELSE Id END FROM Task",
        );
        match &query.fields[0] {
            FieldType::FieldTypeof(t) => {
                assert_eq!(t.field, "Owner");
                assert_eq!(t.conditions.len(), 3);
                assert!(matches!(&t.conditions[2], TypeofCondition::Else { .. }));
            }
            other => panic!("expected FieldTypeof, got {other:?}"),
        }
    }

    #[test]
    fn test_bind_variable() {
        let query = parse_ok("SELECT Id FROM Account WHERE Id IN :idSet");
        let cond = query.r#where.unwrap();
        assert_eq!(cond.value.as_deref(), Some(":idSet"));
        assert_eq!(
            cond.literal_type,
            Some(LiteralTypeTag::Scalar(LiteralType::ApexBindVariable))
        );
    }

    #[test]
    fn test_using_scope_and_security_enforced() {
        let query = parse_ok("SELECT Id FROM Account USING SCOPE mine WITH SECURITY_ENFORCED");
        assert_eq!(query.using_scope, Some(UsingScope::Mine));
        assert_eq!(query.with_security_enforced, Some(true));
    }

    #[test]
    fn test_order_by_is_always_a_vec() {
        let query = parse_ok("SELECT Id FROM Account ORDER BY Name DESC NULLS LAST, CreatedDate");
        assert_eq!(query.order_by.len(), 2);
        assert_eq!(query.order_by[0].order, Some(OrderDirection::Desc));
        assert_eq!(query.order_by[0].nulls, Some(NullsOrder::Last));
    }

    #[test]
    fn test_limit_offset() {
        let query = parse_ok("SELECT Id FROM Account LIMIT 10 OFFSET 5");
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(5));
    }

    #[test]
    fn test_group_by_cube() {
        let query = parse_ok("SELECT Type, COUNT(Id) FROM Account GROUP BY CUBE(Type, Rating)");
        let gb = query.group_by.unwrap();
        assert!(gb.field.is_none());
        let func = gb.fn_.unwrap();
        assert_eq!(func.function_name, "CUBE");
        assert_eq!(func.parameters.len(), 2);
    }

    #[test]
    fn test_unbalanced_parens_recorded_as_error() {
        let mut parser = Parser::new("SELECT Id FROM Account WHERE (Name = 'x'");
        let _ = parser.parse_query();
        assert!(parser
            .errors()
            .iter()
            .any(|e| matches!(e, ParseError::UnbalancedParens { clause } if *clause == "WHERE")));
    }

    #[test]
    fn test_typeof_missing_when_recorded() {
        let mut parser = Parser::new("SELECT TYPEOF Owner ELSE Id END FROM Task");
        let _ = parser.parse_query();
        assert!(parser
            .errors()
            .iter()
            .any(|e| matches!(e, ParseError::TypeofMissingWhen { field } if field == "Owner")));
    }
}
