//! Recursive-descent parser for the CockroachDB DDL subset, with a Pratt
//! parser for expressions (`DEFAULT`, computed columns, `CHECK`, and dump
//! `INSERT`/`UPDATE` values).

use super::error::ParseError;
use super::pratt::{infix_binding_power, prefix_binding_power, token_to_binary_op, token_to_unary_op};
use crate::ast::{
    AlterTableAction, AlterTableStatement, AlterTypeAction, AlterTypeStatement, BinaryOp,
    ColumnDef, CreateIndexStatement, CreateRoutineStatement, CreateSchemaStatement,
    CreateSequenceStatement, CreateTableStatement, CreateTriggerStatement, CreateTypeStatement,
    CreateViewStatement, DataType, DropStatement, Expr, ForEach, IndexColumn, InsertStatement,
    Literal, ObjectKind, OrderDirection, QualifiedName, RoutineParam, Statement, TableConstraint,
    TriggerEvent, TriggerTiming, UpdateStatement, Volatility,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

type PResult<T> = Result<T, ParseError>;

/// A hand-written recursive-descent parser over a token stream produced by
/// [`crate::lexer::Lexer`].
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Creates a parser over the given source text.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self { tokens: Lexer::new(input).tokenize(), pos: 0 }
    }

    /// Parses every statement in the input, splitting on `;`. `BEGIN`/
    /// `COMMIT` are recognized as transaction-boundary pseudo-statements.
    pub fn parse_statements(&mut self) -> PResult<Vec<Statement>> {
        let mut statements = Vec::new();
        self.skip_semicolons();
        while !self.at_eof() {
            statements.push(self.parse_statement()?);
            self.skip_semicolons();
        }
        Ok(statements)
    }

    /// Parses exactly one statement and consumes its trailing `;` if
    /// present.
    pub fn parse_statement(&mut self) -> PResult<Statement> {
        let stmt = match self.peek_keyword() {
            Some(Keyword::Create) => self.parse_create()?,
            Some(Keyword::Alter) => self.parse_alter()?,
            Some(Keyword::Drop) => self.parse_drop()?,
            Some(Keyword::Insert) => self.parse_insert()?,
            Some(Keyword::Update) => self.parse_update()?,
            Some(Keyword::Begin) => {
                self.advance();
                if self.peek_keyword() == Some(Keyword::Transaction) {
                    self.advance();
                }
                Statement::Begin
            }
            Some(Keyword::Commit) => {
                self.advance();
                Statement::Commit
            }
            _ => {
                let tok = self.peek().clone();
                return Err(ParseError::unexpected("a DDL or DML statement", tok.kind, tok.span));
            }
        };
        if self.peek().kind == TokenKind::Semicolon {
            self.advance();
        }
        Ok(stmt)
    }

    // ---- token stream helpers -------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_keyword(&self) -> Option<Keyword> {
        self.peek().as_keyword()
    }

    fn at_eof(&self) -> bool {
        self.peek().is_eof()
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn skip_semicolons(&mut self) {
        while self.peek_kind() == &TokenKind::Semicolon {
            self.advance();
        }
    }

    /// Consumes an unreserved word (not present in the [`Keyword`] table, so
    /// it lexes as a plain identifier), matching case-insensitively.
    fn eat_word(&mut self, word: &str) -> bool {
        if let TokenKind::Identifier(name) = self.peek_kind() {
            if name.eq_ignore_ascii_case(word) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.peek_keyword() == Some(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> PResult<()> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            let tok = self.peek().clone();
            Err(ParseError::unexpected(kw.as_str(), tok.kind, tok.span))
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<()> {
        if self.eat(&kind) {
            Ok(())
        } else {
            let tok = self.peek().clone();
            Err(ParseError::unexpected(format!("{kind:?}"), tok.kind, tok.span))
        }
    }

    fn parse_identifier(&mut self) -> PResult<String> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            // CockroachDB permits a number of non-reserved keywords as
            // identifiers in some positions (e.g. a column literally named
            // `value`); fall back to the keyword's own spelling.
            TokenKind::Keyword(kw) => {
                self.advance();
                Ok(kw.as_str().to_ascii_lowercase())
            }
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::unexpected("an identifier", tok.kind, tok.span))
            }
        }
    }

    fn parse_string_literal(&mut self) -> PResult<String> {
        match self.peek_kind().clone() {
            TokenKind::String(s) => {
                self.advance();
                Ok(s)
            }
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::unexpected("a string literal", tok.kind, tok.span))
            }
        }
    }

    fn parse_integer_literal(&mut self) -> PResult<i64> {
        match self.peek_kind().clone() {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(n)
            }
            TokenKind::Minus => {
                self.advance();
                match self.peek_kind().clone() {
                    TokenKind::Integer(n) => {
                        self.advance();
                        Ok(-n)
                    }
                    _ => {
                        let tok = self.peek().clone();
                        Err(ParseError::unexpected("an integer literal", tok.kind, tok.span))
                    }
                }
            }
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::unexpected("an integer literal", tok.kind, tok.span))
            }
        }
    }

    /// Parses `name` or `schema.name`.
    fn parse_qualified_name(&mut self) -> PResult<QualifiedName> {
        let first = self.parse_identifier()?;
        if self.eat(&TokenKind::Dot) {
            let second = self.parse_identifier()?;
            Ok(QualifiedName::qualified(first, second))
        } else {
            Ok(QualifiedName::bare(first))
        }
    }

    /// Parses `table.column`, `schema.table.column`, or bare `column`,
    /// folding any schema prefix into the returned table qualifier (the
    /// name resolver performs the schema/table disambiguation later).
    fn parse_dotted_path(&mut self) -> PResult<(Option<String>, String)> {
        let first = self.parse_identifier()?;
        if self.eat(&TokenKind::Dot) {
            let second = self.parse_identifier()?;
            if self.eat(&TokenKind::Dot) {
                let third = self.parse_identifier()?;
                Ok((Some(format!("{first}.{second}")), third))
            } else {
                Ok((Some(first), second))
            }
        } else {
            Ok((None, first))
        }
    }

    fn parse_identifier_list(&mut self) -> PResult<Vec<String>> {
        self.expect(TokenKind::LeftParen)?;
        let mut names = vec![self.parse_identifier()?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.parse_identifier()?);
        }
        self.expect(TokenKind::RightParen)?;
        Ok(names)
    }

    fn opt_length(&mut self) -> PResult<Option<u32>> {
        if self.eat(&TokenKind::LeftParen) {
            let n = self.parse_integer_literal()?;
            self.expect(TokenKind::RightParen)?;
            Ok(Some(n as u32))
        } else {
            Ok(None)
        }
    }

    fn opt_precision_scale(&mut self) -> PResult<(Option<u16>, Option<u16>)> {
        if self.eat(&TokenKind::LeftParen) {
            let precision = self.parse_integer_literal()? as u16;
            let scale = if self.eat(&TokenKind::Comma) {
                Some(self.parse_integer_literal()? as u16)
            } else {
                None
            };
            self.expect(TokenKind::RightParen)?;
            Ok((Some(precision), scale))
        } else {
            Ok((None, None))
        }
    }

    /// Parses a data type, including the trailing `[]` array suffix.
    fn parse_data_type(&mut self) -> PResult<DataType> {
        let base = match self.peek_keyword() {
            Some(Keyword::Smallint | Keyword::Int2) => {
                self.advance();
                DataType::Smallint
            }
            Some(Keyword::Int | Keyword::Integer | Keyword::Int4) => {
                self.advance();
                DataType::Integer
            }
            Some(Keyword::Bigint | Keyword::Int8) => {
                self.advance();
                DataType::Bigint
            }
            Some(Keyword::Real) => {
                self.advance();
                DataType::Real
            }
            Some(Keyword::Double) => {
                self.advance();
                let _ = self.eat_keyword(Keyword::Precision);
                DataType::Double
            }
            Some(Keyword::Float) => {
                self.advance();
                let _ = self.opt_length()?;
                DataType::Double
            }
            Some(Keyword::Decimal) => {
                self.advance();
                let (precision, scale) = self.opt_precision_scale()?;
                DataType::Decimal { precision, scale }
            }
            Some(Keyword::Numeric) => {
                self.advance();
                let (precision, scale) = self.opt_precision_scale()?;
                DataType::Numeric { precision, scale }
            }
            Some(Keyword::Char) => {
                self.advance();
                DataType::Char(self.opt_length()?)
            }
            Some(Keyword::Varchar) => {
                self.advance();
                DataType::Varchar(self.opt_length()?)
            }
            Some(Keyword::String | Keyword::Text) => {
                self.advance();
                let _ = self.opt_length()?;
                DataType::Text
            }
            Some(Keyword::Bytes | Keyword::Blob) => {
                self.advance();
                DataType::Bytes
            }
            Some(Keyword::Bool | Keyword::Boolean) => {
                self.advance();
                DataType::Boolean
            }
            Some(Keyword::Date) => {
                self.advance();
                DataType::Date
            }
            Some(Keyword::Time) => {
                self.advance();
                DataType::Time
            }
            Some(Keyword::Timestamptz) => {
                self.advance();
                DataType::Timestamptz
            }
            Some(Keyword::Timestamp) => {
                self.advance();
                // `WITH`/`WITHOUT` aren't reserved in our keyword table (CRDB
                // accepts the bare `TIMESTAMPTZ` spelling instead), so only
                // the trailing `ZONE` keyword of `... TIME ZONE` is checked.
                if self.peek_keyword() == Some(Keyword::Zone) {
                    self.advance();
                    DataType::Timestamptz
                } else {
                    DataType::Timestamp
                }
            }
            Some(Keyword::Uuid) => {
                self.advance();
                DataType::Uuid
            }
            Some(Keyword::Jsonb | Keyword::Json) => {
                self.advance();
                DataType::Jsonb
            }
            Some(Keyword::Inet) => {
                self.advance();
                DataType::Inet
            }
            Some(Keyword::Serial) => {
                self.advance();
                DataType::Bigint
            }
            Some(Keyword::Bigserial) => {
                self.advance();
                DataType::Bigint
            }
            _ => DataType::Custom(self.parse_qualified_name_as_string()?),
        };

        let mut result = base;
        while self.eat(&TokenKind::LeftBracket) {
            self.expect(TokenKind::RightBracket)?;
            result = DataType::Array(Box::new(result));
        }
        Ok(result)
    }

    fn parse_qualified_name_as_string(&mut self) -> PResult<String> {
        let qn = self.parse_qualified_name()?;
        Ok(match qn.schema {
            Some(schema) => format!("{schema}.{}", qn.name),
            None => qn.name,
        })
    }

    // ---- expressions -----------------------------------------------------

    /// Parses an expression using Pratt (operator-precedence) parsing.
    pub fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> PResult<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let kind = self.peek_kind().clone();

            if kind == TokenKind::DoubleColon {
                let (l_bp, _) = infix_binding_power(&kind).unwrap();
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let data_type = self.parse_data_type()?;
                lhs = Expr::Cast { expr: Box::new(lhs), data_type };
                continue;
            }

            if let Some(kw) = self.peek_keyword() {
                if kw == Keyword::Not {
                    // Lookahead for `NOT BETWEEN` / `NOT IN` / `NOT LIKE`.
                    let save = self.pos;
                    self.advance();
                    let negated_result = self.try_parse_negatable_infix(lhs.clone(), min_bp)?;
                    match negated_result {
                        Some(expr) => {
                            lhs = expr;
                            continue;
                        }
                        None => {
                            self.pos = save;
                        }
                    }
                }
                if kw == Keyword::Is {
                    let (l_bp, _) = infix_binding_power(&kind).unwrap();
                    if l_bp < min_bp {
                        break;
                    }
                    self.advance();
                    let negated = self.eat_keyword(Keyword::Not);
                    self.expect_keyword(Keyword::Null)?;
                    lhs = Expr::IsNull { expr: Box::new(lhs), negated };
                    continue;
                }
                if kw == Keyword::Between {
                    let (l_bp, _) = infix_binding_power(&kind).unwrap();
                    if l_bp < min_bp {
                        break;
                    }
                    self.advance();
                    let low = self.parse_expr_bp(7)?;
                    self.expect_keyword(Keyword::And)?;
                    let high = self.parse_expr_bp(7)?;
                    lhs = Expr::Between { expr: Box::new(lhs), low: Box::new(low), high: Box::new(high), negated: false };
                    continue;
                }
                if kw == Keyword::In {
                    let (l_bp, _) = infix_binding_power(&kind).unwrap();
                    if l_bp < min_bp {
                        break;
                    }
                    self.advance();
                    let list = self.parse_paren_expr_list()?;
                    lhs = Expr::In { expr: Box::new(lhs), list, negated: false };
                    continue;
                }
            }

            let Some((l_bp, r_bp)) = infix_binding_power(&kind) else { break };
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr_bp(r_bp)?;
            let op = token_to_binary_op(&kind).expect("infix token without BinaryOp mapping");
            lhs = Expr::Binary { left: Box::new(lhs), op, right: Box::new(rhs) };
        }

        Ok(lhs)
    }

    fn try_parse_negatable_infix(&mut self, lhs: Expr, _min_bp: u8) -> PResult<Option<Expr>> {
        match self.peek_keyword() {
            Some(Keyword::Between) => {
                self.advance();
                let low = self.parse_expr_bp(7)?;
                self.expect_keyword(Keyword::And)?;
                let high = self.parse_expr_bp(7)?;
                Ok(Some(Expr::Between { expr: Box::new(lhs), low: Box::new(low), high: Box::new(high), negated: true }))
            }
            Some(Keyword::In) => {
                self.advance();
                let list = self.parse_paren_expr_list()?;
                Ok(Some(Expr::In { expr: Box::new(lhs), list, negated: true }))
            }
            Some(Keyword::Like) => {
                self.advance();
                let rhs = self.parse_expr_bp(6)?;
                Ok(Some(Expr::Unary {
                    op: crate::ast::UnaryOp::Not,
                    operand: Box::new(Expr::Binary { left: Box::new(lhs), op: BinaryOp::Like, right: Box::new(rhs) }),
                }))
            }
            _ => Ok(None),
        }
    }

    fn parse_paren_expr_list(&mut self) -> PResult<Vec<Expr>> {
        self.expect(TokenKind::LeftParen)?;
        let mut items = Vec::new();
        if self.peek_kind() != &TokenKind::RightParen {
            items.push(self.parse_expr()?);
            while self.eat(&TokenKind::Comma) {
                items.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::RightParen)?;
        Ok(items)
    }

    fn parse_prefix(&mut self) -> PResult<Expr> {
        let kind = self.peek_kind().clone();
        let span = self.peek().span;

        if prefix_binding_power(&kind).is_none() {
            return Err(ParseError::unexpected("an expression", kind, span));
        }

        if let Some(op) = token_to_unary_op(&kind) {
            if matches!(kind, TokenKind::Minus | TokenKind::BitNot | TokenKind::Keyword(Keyword::Not)) {
                self.advance();
                let bp = prefix_binding_power(&kind).unwrap_or(15);
                let operand = self.parse_expr_bp(bp.max(1))?;
                return Ok(Expr::Unary { op, operand: Box::new(operand) });
            }
        }

        match kind {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Integer(n)))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::Literal(Literal::Float(f)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(s)))
            }
            TokenKind::Star => {
                self.advance();
                Ok(Expr::Wildcard)
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RightParen)?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Keyword(Keyword::Cast) => self.parse_cast(),
            TokenKind::Keyword(Keyword::Case) => self.parse_case(),
            TokenKind::Keyword(Keyword::Coalesce) | TokenKind::Keyword(Keyword::Nullif) => {
                self.parse_function_call()
            }
            TokenKind::Identifier(_) => self.parse_column_or_function(span),
            _ => Err(ParseError::unexpected("an expression", kind, span)),
        }
    }

    fn parse_cast(&mut self) -> PResult<Expr> {
        self.expect_keyword(Keyword::Cast)?;
        self.expect(TokenKind::LeftParen)?;
        let expr = self.parse_expr()?;
        self.expect_keyword(Keyword::As)?;
        let data_type = self.parse_data_type()?;
        self.expect(TokenKind::RightParen)?;
        Ok(Expr::Cast { expr: Box::new(expr), data_type })
    }

    fn parse_case(&mut self) -> PResult<Expr> {
        self.expect_keyword(Keyword::Case)?;
        let operand = if self.peek_keyword() != Some(Keyword::When) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        let mut when_clauses = Vec::new();
        while self.eat_keyword(Keyword::When) {
            let cond = self.parse_expr()?;
            self.expect_keyword(Keyword::Then)?;
            let result = self.parse_expr()?;
            when_clauses.push((cond, result));
        }
        let else_clause = if self.eat_keyword(Keyword::Else) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect_keyword(Keyword::End)?;
        Ok(Expr::Case { operand, when_clauses, else_clause })
    }

    fn parse_function_call(&mut self) -> PResult<Expr> {
        let name = self.parse_identifier()?;
        let args = self.parse_paren_expr_list()?;
        Ok(Expr::Function(crate::ast::FunctionCall { schema: None, name, args }))
    }

    /// Parses a dotted identifier chain as either a column reference or, if
    /// followed by `(`, a (possibly schema-qualified) function call.
    fn parse_column_or_function(&mut self, span: Span) -> PResult<Expr> {
        let (qualifier, name) = self.parse_dotted_path()?;
        if self.eat(&TokenKind::LeftParen) {
            let mut args = Vec::new();
            if self.peek_kind() != &TokenKind::RightParen {
                if self.peek_kind() == &TokenKind::Star {
                    self.advance();
                    args.push(Expr::Wildcard);
                } else {
                    args.push(self.parse_expr()?);
                }
                while self.eat(&TokenKind::Comma) {
                    args.push(self.parse_expr()?);
                }
            }
            self.expect(TokenKind::RightParen)?;
            Ok(Expr::Function(crate::ast::FunctionCall { schema: qualifier, name, args }))
        } else {
            Ok(Expr::Column { table: qualifier, name, span })
        }
    }

    // ---- CREATE ------------------------------------------------------------

    fn parse_create(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Create)?;
        let or_replace = self.eat_keyword(Keyword::Or) && {
            self.expect_keyword(Keyword::Replace)?;
            true
        };
        let unique = self.eat_keyword(Keyword::Unique);
        let materialized = self.eat_keyword(Keyword::Materialized);
        let _ = self.eat_keyword(Keyword::Temporary) || self.eat_keyword(Keyword::Temp);

        match self.peek_keyword() {
            Some(Keyword::Schema) => self.parse_create_schema(),
            Some(Keyword::Table) => self.parse_create_table(),
            Some(Keyword::Type) => self.parse_create_type(),
            Some(Keyword::Sequence) => self.parse_create_sequence(),
            Some(Keyword::View) => self.parse_create_view(or_replace, materialized),
            Some(Keyword::Function | Keyword::Procedure) => self.parse_create_routine(or_replace),
            Some(Keyword::Trigger) => self.parse_create_trigger(),
            Some(Keyword::Index) => self.parse_create_index(unique),
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::unexpected("a CREATE object kind", tok.kind, tok.span))
            }
        }
    }

    fn parse_if_not_exists(&mut self) -> bool {
        if self.peek_keyword() == Some(Keyword::If) {
            let save = self.pos;
            self.advance();
            if self.eat_keyword(Keyword::Not) && self.eat_keyword(Keyword::Exists) {
                return true;
            }
            self.pos = save;
        }
        false
    }

    fn parse_create_schema(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Schema)?;
        let if_not_exists = self.parse_if_not_exists();
        let name = self.parse_identifier()?;
        Ok(Statement::CreateSchema(CreateSchemaStatement { name, if_not_exists }))
    }

    fn parse_create_table(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Table)?;
        let if_not_exists = self.parse_if_not_exists();
        let name = self.parse_qualified_name()?;
        self.expect(TokenKind::LeftParen)?;

        let mut columns = Vec::new();
        let mut constraints = Vec::new();

        loop {
            if self.is_table_constraint_start() {
                constraints.push(self.parse_table_constraint()?);
            } else {
                columns.push(self.parse_column_def()?);
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen)?;

        Ok(Statement::CreateTable(CreateTableStatement { name, if_not_exists, columns, constraints }))
    }

    fn is_table_constraint_start(&self) -> bool {
        matches!(
            self.peek_keyword(),
            Some(Keyword::Primary | Keyword::Unique | Keyword::Foreign | Keyword::Check | Keyword::Constraint)
        )
    }

    fn parse_table_constraint(&mut self) -> PResult<TableConstraint> {
        let name = if self.eat_keyword(Keyword::Constraint) {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        match self.peek_keyword() {
            Some(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let columns = self.parse_identifier_list()?;
                Ok(TableConstraint::PrimaryKey { name, columns })
            }
            Some(Keyword::Unique) => {
                self.advance();
                let columns = self.parse_identifier_list()?;
                Ok(TableConstraint::Unique { name, columns })
            }
            Some(Keyword::Foreign) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let columns = self.parse_identifier_list()?;
                self.expect_keyword(Keyword::References)?;
                let ref_table = self.parse_qualified_name()?;
                let ref_columns = self.parse_identifier_list()?;
                let (on_delete, on_update) = self.parse_referential_actions()?;
                Ok(TableConstraint::ForeignKey { name, columns, ref_table, ref_columns, on_delete, on_update })
            }
            Some(Keyword::Check) => {
                self.advance();
                self.expect(TokenKind::LeftParen)?;
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RightParen)?;
                Ok(TableConstraint::Check { name, expr })
            }
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::unexpected("a table constraint", tok.kind, tok.span))
            }
        }
    }

    fn parse_referential_actions(&mut self) -> PResult<(Option<String>, Option<String>)> {
        let mut on_delete = None;
        let mut on_update = None;
        loop {
            if self.peek_keyword() == Some(Keyword::On) {
                let save = self.pos;
                self.advance();
                match self.peek_keyword() {
                    Some(Keyword::Delete) => {
                        self.advance();
                        on_delete = Some(self.parse_referential_action_keyword()?);
                    }
                    Some(Keyword::Update) => {
                        self.advance();
                        on_update = Some(self.parse_referential_action_keyword()?);
                    }
                    _ => {
                        self.pos = save;
                        break;
                    }
                }
            } else {
                break;
            }
        }
        Ok((on_delete, on_update))
    }

    fn parse_referential_action_keyword(&mut self) -> PResult<String> {
        match self.peek_keyword() {
            Some(Keyword::Cascade) => {
                self.advance();
                Ok("CASCADE".to_string())
            }
            Some(Keyword::Restrict) => {
                self.advance();
                Ok("RESTRICT".to_string())
            }
            Some(Keyword::Set) => {
                self.advance();
                if self.eat_keyword(Keyword::Null) {
                    Ok("SET NULL".to_string())
                } else {
                    self.expect_keyword(Keyword::Default)?;
                    Ok("SET DEFAULT".to_string())
                }
            }
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::unexpected("a referential action", tok.kind, tok.span))
            }
        }
    }

    fn parse_column_def(&mut self) -> PResult<ColumnDef> {
        let name = self.parse_identifier()?;
        let data_type = self.parse_data_type()?;
        let mut col = ColumnDef::new(name, data_type);

        loop {
            match self.peek_keyword() {
                Some(Keyword::Not) => {
                    self.advance();
                    self.expect_keyword(Keyword::Null)?;
                    col.nullable = false;
                }
                Some(Keyword::Null) => {
                    self.advance();
                    col.nullable = true;
                }
                Some(Keyword::Primary) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    col.primary_key = true;
                    col.nullable = false;
                }
                Some(Keyword::Unique) => {
                    self.advance();
                    col.unique = true;
                }
                Some(Keyword::Default) => {
                    self.advance();
                    col.default = Some(self.parse_default_expr()?);
                }
                Some(Keyword::As) => {
                    self.advance();
                    self.expect(TokenKind::LeftParen)?;
                    let expr = self.parse_expr()?;
                    self.expect(TokenKind::RightParen)?;
                    let stored = if self.eat_keyword(Keyword::Stored) {
                        true
                    } else {
                        self.expect_keyword(Keyword::Virtual)?;
                        false
                    };
                    col = col.computed(expr, stored);
                }
                _ => break,
            }
        }

        Ok(col)
    }

    /// Parses a `DEFAULT` expression, narrowed to operator precedence 13
    /// (additive/comparison) so a trailing `NOT NULL` etc. isn't swallowed
    /// as part of the expression.
    fn parse_default_expr(&mut self) -> PResult<Expr> {
        self.parse_expr_bp(1)
    }

    fn parse_create_type(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Type)?;
        let name = self.parse_qualified_name()?;
        self.expect_keyword(Keyword::As)?;
        self.expect_keyword(Keyword::Enum)?;
        self.expect(TokenKind::LeftParen)?;
        let mut values = vec![self.parse_string_literal()?];
        while self.eat(&TokenKind::Comma) {
            values.push(self.parse_string_literal()?);
        }
        self.expect(TokenKind::RightParen)?;
        Ok(Statement::CreateType(CreateTypeStatement { name, values }))
    }

    fn parse_create_sequence(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Sequence)?;
        let if_not_exists = self.parse_if_not_exists();
        let name = self.parse_qualified_name()?;
        let mut increment = None;
        let mut start = None;
        let mut owned_by = None;

        loop {
            if self.peek_keyword() == Some(Keyword::Generated) {
                // The `GENERATED { ALWAYS | BY DEFAULT } AS IDENTITY` form is
                // owner-table-local; not modeled standalone.
                break;
            }
            // `INCREMENT`, `START`, `OWNED`, and `WITH` aren't reserved in
            // our keyword table, so they surface as plain identifiers.
            if self.eat_word("INCREMENT") {
                let _ = self.eat_keyword(Keyword::By);
                increment = Some(self.parse_integer_literal()?);
            } else if self.eat_word("START") {
                let _ = self.eat_word("WITH");
                start = Some(self.parse_integer_literal()?);
            } else if self.eat_word("OWNED") {
                self.expect_keyword(Keyword::By)?;
                let (table_qualifier, column) = self.parse_dotted_path()?;
                let table = match table_qualifier {
                    Some(q) => QualifiedName::bare(q),
                    None => return Err(ParseError::new("OWNED BY requires table.column", self.peek().span)),
                };
                owned_by = Some((table, column));
            } else {
                break;
            }
        }

        Ok(Statement::CreateSequence(CreateSequenceStatement { name, if_not_exists, increment, start, owned_by }))
    }

    fn parse_create_view(&mut self, or_replace: bool, materialized: bool) -> PResult<Statement> {
        self.expect_keyword(Keyword::View)?;
        let name = self.parse_qualified_name()?;
        let mut columns = Vec::new();
        if self.eat(&TokenKind::LeftParen) {
            columns.push(self.parse_identifier()?);
            while self.eat(&TokenKind::Comma) {
                columns.push(self.parse_identifier()?);
            }
            self.expect(TokenKind::RightParen)?;
        }
        self.expect_keyword(Keyword::As)?;
        let query = self.consume_raw_until_statement_end();
        Ok(Statement::CreateView(CreateViewStatement { name, or_replace, materialized, columns, query }))
    }

    /// Captures the rest of the current statement's tokens verbatim as
    /// canonicalized text (used for view/routine bodies, which are not
    /// parsed into a tree — see module docs).
    fn consume_raw_until_statement_end(&mut self) -> String {
        let mut parts = Vec::new();
        let mut depth: i32 = 0;
        loop {
            match self.peek_kind() {
                TokenKind::Semicolon if depth == 0 => break,
                TokenKind::Eof => break,
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth -= 1,
                _ => {}
            }
            parts.push(crate::printer::render_token(self.peek_kind()));
            self.advance();
        }
        parts.join(" ")
    }

    fn parse_create_routine(&mut self, or_replace: bool) -> PResult<Statement> {
        self.advance(); // FUNCTION | PROCEDURE
        let name = self.parse_qualified_name()?;
        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if self.peek_kind() != &TokenKind::RightParen {
            params.push(self.parse_routine_param()?);
            while self.eat(&TokenKind::Comma) {
                params.push(self.parse_routine_param()?);
            }
        }
        self.expect(TokenKind::RightParen)?;

        let mut returns = None;
        if self.eat_keyword(Keyword::Returns) {
            let _ = self.eat_keyword(Keyword::Setof);
            returns = Some(self.parse_data_type()?);
        }

        let mut language = "sql".to_string();
        let mut volatility = Volatility::Volatile;
        let mut body = String::new();

        loop {
            match self.peek_keyword() {
                Some(Keyword::Language) => {
                    self.advance();
                    language = self.parse_identifier()?;
                }
                Some(Keyword::Immutable) => {
                    self.advance();
                    volatility = Volatility::Immutable;
                }
                Some(Keyword::Stable) => {
                    self.advance();
                    volatility = Volatility::Stable;
                }
                Some(Keyword::Volatile) => {
                    self.advance();
                    volatility = Volatility::Volatile;
                }
                Some(Keyword::Called | Keyword::Strict | Keyword::Leakproof) => {
                    self.advance();
                    // CALLED ON NULL INPUT / STRICT / LEAKPROOF — accepted
                    // and not separately modeled.
                    while self.peek_keyword().is_some()
                        && !matches!(self.peek_keyword(), Some(Keyword::As) | None)
                        && self.peek_kind() != &TokenKind::Semicolon
                    {
                        if matches!(
                            self.peek_keyword(),
                            Some(Keyword::Language | Keyword::Immutable | Keyword::Stable | Keyword::Volatile)
                        ) {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(Keyword::As) => {
                    self.advance();
                    body = match self.peek_kind().clone() {
                        TokenKind::DollarQuotedString(s) => {
                            self.advance();
                            s
                        }
                        TokenKind::String(s) => {
                            self.advance();
                            s
                        }
                        _ => {
                            let tok = self.peek().clone();
                            return Err(ParseError::unexpected("a routine body", tok.kind, tok.span));
                        }
                    };
                }
                _ => break,
            }
        }

        Ok(Statement::CreateRoutine(CreateRoutineStatement { name, or_replace, params, returns, language, volatility, body }))
    }

    fn parse_routine_param(&mut self) -> PResult<RoutineParam> {
        let name = self.parse_identifier()?;
        let data_type = self.parse_data_type()?;
        Ok(RoutineParam { name, data_type })
    }

    fn parse_create_trigger(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Trigger)?;
        let name = self.parse_identifier()?;

        let timing = match self.peek_keyword() {
            Some(Keyword::Before) => {
                self.advance();
                TriggerTiming::Before
            }
            Some(Keyword::After) => {
                self.advance();
                TriggerTiming::After
            }
            Some(Keyword::Instead) => {
                self.advance();
                self.expect_keyword(Keyword::Of)?;
                TriggerTiming::InsteadOf
            }
            _ => {
                let tok = self.peek().clone();
                return Err(ParseError::unexpected("BEFORE, AFTER, or INSTEAD OF", tok.kind, tok.span));
            }
        };

        let mut events = vec![self.parse_trigger_event()?];
        while self.eat_keyword(Keyword::Or) {
            events.push(self.parse_trigger_event()?);
        }

        self.expect_keyword(Keyword::On)?;
        let table = self.parse_qualified_name()?;

        let for_each = if self.eat_keyword(Keyword::For) {
            let _ = self.eat_keyword(Keyword::Each);
            if self.eat_keyword(Keyword::Row) {
                ForEach::Row
            } else {
                self.expect_keyword(Keyword::Statement)?;
                ForEach::Statement
            }
        } else {
            ForEach::Statement
        };

        self.expect_keyword(Keyword::Execute)?;
        let _ = self.eat_keyword(Keyword::Function) || self.eat_keyword(Keyword::Procedure);
        let function = self.parse_qualified_name()?;
        self.expect(TokenKind::LeftParen)?;
        self.expect(TokenKind::RightParen)?;

        Ok(Statement::CreateTrigger(CreateTriggerStatement { name, table, timing, events, for_each, function }))
    }

    fn parse_trigger_event(&mut self) -> PResult<TriggerEvent> {
        match self.peek_keyword() {
            Some(Keyword::Insert) => {
                self.advance();
                Ok(TriggerEvent::Insert)
            }
            Some(Keyword::Update) => {
                self.advance();
                Ok(TriggerEvent::Update)
            }
            Some(Keyword::Delete) => {
                self.advance();
                Ok(TriggerEvent::Delete)
            }
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::unexpected("INSERT, UPDATE, or DELETE", tok.kind, tok.span))
            }
        }
    }

    fn parse_create_index(&mut self, unique: bool) -> PResult<Statement> {
        self.expect_keyword(Keyword::Index)?;
        let concurrently = self.eat_keyword(Keyword::Concurrently);
        let if_not_exists = self.parse_if_not_exists();
        let name = self.parse_identifier()?;
        self.expect_keyword(Keyword::On)?;
        let table = self.parse_qualified_name()?;
        self.expect(TokenKind::LeftParen)?;
        let mut columns = vec![self.parse_index_column()?];
        while self.eat(&TokenKind::Comma) {
            columns.push(self.parse_index_column()?);
        }
        self.expect(TokenKind::RightParen)?;

        let mut storing = Vec::new();
        if self.eat_keyword(Keyword::Storing) {
            storing = self.parse_identifier_list()?;
        }

        let where_predicate = if self.eat_keyword(Keyword::Where) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Statement::CreateIndex(CreateIndexStatement {
            name,
            table,
            unique,
            if_not_exists,
            concurrently,
            columns,
            storing,
            where_predicate,
        }))
    }

    fn parse_index_column(&mut self) -> PResult<IndexColumn> {
        let name = self.parse_identifier()?;
        let direction = if self.eat_keyword(Keyword::Desc) {
            OrderDirection::Desc
        } else {
            let _ = self.eat_keyword(Keyword::Asc);
            OrderDirection::Asc
        };
        Ok(IndexColumn { name, direction })
    }

    // ---- ALTER ---------------------------------------------------------------

    fn parse_alter(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Alter)?;
        match self.peek_keyword() {
            Some(Keyword::Table) => self.parse_alter_table(),
            Some(Keyword::Type) => self.parse_alter_type(),
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::unexpected("TABLE or TYPE", tok.kind, tok.span))
            }
        }
    }

    fn parse_alter_table(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Table)?;
        let _ = self.parse_if_exists();
        let table = self.parse_qualified_name()?;
        let mut actions = vec![self.parse_alter_table_action()?];
        while self.eat(&TokenKind::Comma) {
            actions.push(self.parse_alter_table_action()?);
        }
        Ok(Statement::AlterTable(AlterTableStatement { table, actions }))
    }

    fn parse_if_exists(&mut self) -> bool {
        if self.peek_keyword() == Some(Keyword::If) {
            let save = self.pos;
            self.advance();
            if self.eat_keyword(Keyword::Exists) {
                return true;
            }
            self.pos = save;
        }
        false
    }

    fn parse_alter_table_action(&mut self) -> PResult<AlterTableAction> {
        match self.peek_keyword() {
            Some(Keyword::Add) => {
                self.advance();
                if self.peek_keyword() == Some(Keyword::Constraint)
                    || self.is_table_constraint_start()
                {
                    Ok(AlterTableAction::AddConstraint(self.parse_table_constraint()?))
                } else {
                    let _ = self.eat_keyword(Keyword::Column);
                    Ok(AlterTableAction::AddColumn(self.parse_column_def()?))
                }
            }
            Some(Keyword::Drop) => {
                self.advance();
                if self.eat_keyword(Keyword::Constraint) {
                    let name = self.parse_identifier()?;
                    Ok(AlterTableAction::DropConstraint { name })
                } else {
                    let _ = self.eat_keyword(Keyword::Column);
                    let name = self.parse_identifier()?;
                    let restrict = self.eat_keyword(Keyword::Restrict);
                    let _ = self.eat_keyword(Keyword::Cascade);
                    Ok(AlterTableAction::DropColumn { name, restrict })
                }
            }
            Some(Keyword::Alter) => {
                self.advance();
                let _ = self.eat_keyword(Keyword::Column);
                let name = self.parse_identifier()?;
                match self.peek_keyword() {
                    Some(Keyword::Type) => {
                        self.advance();
                        let data_type = self.parse_data_type()?;
                        let using = if self.eat_keyword(Keyword::Using) {
                            Some(self.parse_expr()?)
                        } else {
                            None
                        };
                        Ok(AlterTableAction::AlterColumnType { name, data_type, using })
                    }
                    Some(Keyword::Set) => {
                        self.advance();
                        if self.eat_keyword(Keyword::Default) {
                            let default = self.parse_expr()?;
                            Ok(AlterTableAction::AlterColumnSetDefault { name, default })
                        } else {
                            self.expect_keyword(Keyword::Not)?;
                            self.expect_keyword(Keyword::Null)?;
                            Ok(AlterTableAction::AlterColumnSetNotNull { name })
                        }
                    }
                    Some(Keyword::Drop) => {
                        self.advance();
                        if self.eat_keyword(Keyword::Default) {
                            Ok(AlterTableAction::AlterColumnDropDefault { name })
                        } else {
                            self.expect_keyword(Keyword::Not)?;
                            self.expect_keyword(Keyword::Null)?;
                            Ok(AlterTableAction::AlterColumnDropNotNull { name })
                        }
                    }
                    _ => {
                        let tok = self.peek().clone();
                        Err(ParseError::unexpected("TYPE, SET, or DROP", tok.kind, tok.span))
                    }
                }
            }
            Some(Keyword::Rename) => {
                self.advance();
                let _ = self.eat_keyword(Keyword::Column);
                let from = self.parse_identifier()?;
                self.expect_keyword(Keyword::To)?;
                let to = self.parse_identifier()?;
                Ok(AlterTableAction::RenameColumn { from, to })
            }
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::unexpected("an ALTER TABLE action", tok.kind, tok.span))
            }
        }
    }

    fn parse_alter_type(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Type)?;
        let name = self.parse_qualified_name()?;
        self.expect_keyword(Keyword::Add)?;
        let action = if self.eat_keyword(Keyword::Value) {
            let if_not_exists = self.parse_if_not_exists();
            let value = self.parse_string_literal()?;
            AlterTypeAction::AddValue { value, if_not_exists }
        } else {
            self.expect_keyword(Keyword::Drop)?;
            self.expect_keyword(Keyword::Value)?;
            let value = self.parse_string_literal()?;
            AlterTypeAction::DropValue { value }
        };
        Ok(Statement::AlterType(AlterTypeStatement { name, action }))
    }

    // ---- DROP ------------------------------------------------------------

    fn parse_drop(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Drop)?;
        let kind = match self.peek_keyword() {
            Some(Keyword::Schema) => {
                self.advance();
                ObjectKind::Schema
            }
            Some(Keyword::Type) => {
                self.advance();
                ObjectKind::Type
            }
            Some(Keyword::Sequence) => {
                self.advance();
                ObjectKind::Sequence
            }
            Some(Keyword::Table) => {
                self.advance();
                ObjectKind::Table
            }
            Some(Keyword::View) => {
                self.advance();
                let _ = self.eat_keyword(Keyword::Materialized);
                ObjectKind::View
            }
            Some(Keyword::Function | Keyword::Procedure) => {
                self.advance();
                ObjectKind::Routine
            }
            Some(Keyword::Trigger) => {
                self.advance();
                ObjectKind::Trigger
            }
            Some(Keyword::Index) => {
                self.advance();
                ObjectKind::Index
            }
            _ => {
                let tok = self.peek().clone();
                return Err(ParseError::unexpected("a droppable object kind", tok.kind, tok.span));
            }
        };

        let if_exists = self.parse_if_exists();

        let (name, signature, on_table) = match kind {
            ObjectKind::Trigger => {
                let name = self.parse_identifier()?;
                self.expect_keyword(Keyword::On)?;
                let table = self.parse_qualified_name()?;
                (QualifiedName::bare(name), None, Some(table))
            }
            ObjectKind::Index => {
                let first = self.parse_identifier()?;
                if self.eat(&TokenKind::Dot) {
                    let index_name = self.parse_identifier()?;
                    (QualifiedName::bare(index_name), None, Some(QualifiedName::bare(first)))
                } else {
                    (QualifiedName::bare(first), None, None)
                }
            }
            ObjectKind::Routine => {
                let name = self.parse_qualified_name()?;
                let signature = if self.peek_kind() == &TokenKind::LeftParen {
                    Some(self.consume_paren_group())
                } else {
                    None
                };
                (name, signature, None)
            }
            _ => (self.parse_qualified_name()?, None, None),
        };

        let cascade = if self.eat_keyword(Keyword::Cascade) {
            true
        } else {
            let _ = self.eat_keyword(Keyword::Restrict);
            false
        };

        Ok(Statement::Drop(DropStatement { kind, name, signature, on_table, if_exists, cascade }))
    }

    fn consume_paren_group(&mut self) -> String {
        let mut parts = Vec::new();
        let mut depth = 0i32;
        loop {
            match self.peek_kind() {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        parts.push(crate::printer::render_token(self.peek_kind()));
                        self.advance();
                        break;
                    }
                }
                TokenKind::Eof => break,
                _ => {}
            }
            parts.push(crate::printer::render_token(self.peek_kind()));
            self.advance();
        }
        parts.join(" ")
    }

    // ---- dump replay: INSERT / UPDATE ----------------------------------------

    fn parse_insert(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table = self.parse_qualified_name()?;
        let columns = self.parse_identifier_list()?;
        self.expect_keyword(Keyword::Values)?;
        let mut rows = vec![self.parse_paren_expr_list()?];
        while self.eat(&TokenKind::Comma) {
            rows.push(self.parse_paren_expr_list()?);
        }
        Ok(Statement::Insert(InsertStatement { table, columns, rows }))
    }

    fn parse_update(&mut self) -> PResult<Statement> {
        self.expect_keyword(Keyword::Update)?;
        let table = self.parse_qualified_name()?;
        self.expect_keyword(Keyword::Set)?;
        let mut assignments = vec![self.parse_assignment()?];
        while self.eat(&TokenKind::Comma) {
            assignments.push(self.parse_assignment()?);
        }
        let where_clause = if self.eat_keyword(Keyword::Where) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Statement::Update(UpdateStatement { table, assignments, where_clause }))
    }

    fn parse_assignment(&mut self) -> PResult<(String, Expr)> {
        let name = self.parse_identifier()?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        Ok((name, value))
    }
}

/// Parses a single DDL/DML statement from source text.
pub fn parse_statement(input: &str) -> PResult<Statement> {
    Parser::new(input).parse_statement()
}

/// Parses every statement in a source text (e.g. one `.sql` file).
pub fn parse_statements(input: &str) -> PResult<Vec<Statement>> {
    Parser::new(input).parse_statements()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DataType, ObjectKind, Statement};

    #[test]
    fn parses_simple_create_table() {
        let stmt = parse_statement("CREATE TABLE users (id INT PRIMARY KEY, name STRING NOT NULL)").unwrap();
        let Statement::CreateTable(t) = stmt else { panic!("expected CreateTable") };
        assert_eq!(t.name.name, "users");
        assert_eq!(t.columns.len(), 2);
        assert!(t.columns[0].primary_key);
        assert!(!t.columns[1].nullable);
    }

    #[test]
    fn parses_computed_column() {
        let stmt = parse_statement(
            "CREATE TABLE orders (quantity INT, committed INT, available INT AS (quantity - committed) STORED)",
        )
        .unwrap();
        let Statement::CreateTable(t) = stmt else { panic!("expected CreateTable") };
        let available = &t.columns[2];
        assert!(available.computed.is_some());
        assert!(available.computed.as_ref().unwrap().stored);
    }

    #[test]
    fn parses_foreign_key_constraint() {
        let stmt = parse_statement(
            "CREATE TABLE categories (id INT PRIMARY KEY, parent_id INT, FOREIGN KEY (parent_id) REFERENCES categories(id))",
        )
        .unwrap();
        let Statement::CreateTable(t) = stmt else { panic!("expected CreateTable") };
        assert_eq!(t.constraints.len(), 1);
        match &t.constraints[0] {
            crate::ast::TableConstraint::ForeignKey { ref_table, .. } => assert_eq!(ref_table.name, "categories"),
            _ => panic!("expected ForeignKey"),
        }
    }

    #[test]
    fn parses_create_type_enum() {
        let stmt = parse_statement("CREATE TYPE status AS ENUM ('open', 'closed')").unwrap();
        let Statement::CreateType(t) = stmt else { panic!("expected CreateType") };
        assert_eq!(t.values, vec!["open".to_string(), "closed".to_string()]);
    }

    #[test]
    fn parses_alter_type_add_value() {
        let stmt = parse_statement("ALTER TYPE status ADD VALUE 'archived'").unwrap();
        let Statement::AlterType(t) = stmt else { panic!("expected AlterType") };
        assert!(matches!(t.action, AlterTypeAction::AddValue { .. }));
    }

    #[test]
    fn parses_create_index_with_storing_and_predicate() {
        let stmt =
            parse_statement("CREATE INDEX email_idx ON users (email) STORING (name) WHERE active").unwrap();
        let Statement::CreateIndex(idx) = stmt else { panic!("expected CreateIndex") };
        assert_eq!(idx.columns[0].name, "email");
        assert_eq!(idx.storing, vec!["name".to_string()]);
        assert!(idx.where_predicate.is_some());
    }

    #[test]
    fn parses_alter_table_multiple_actions() {
        let stmt = parse_statement("ALTER TABLE users ALTER COLUMN age TYPE INT8, ALTER COLUMN age SET NOT NULL").unwrap();
        let Statement::AlterTable(t) = stmt else { panic!("expected AlterTable") };
        assert_eq!(t.actions.len(), 2);
    }

    #[test]
    fn parses_drop_table_if_exists_cascade() {
        let stmt = parse_statement("DROP TABLE IF EXISTS users CASCADE").unwrap();
        let Statement::Drop(d) = stmt else { panic!("expected Drop") };
        assert_eq!(d.kind, ObjectKind::Table);
        assert!(d.if_exists);
        assert!(d.cascade);
    }

    #[test]
    fn parses_insert_multi_row() {
        let stmt = parse_statement(
            "INSERT INTO categories (id, name) VALUES (1, 'Root'), (2, 'Child')",
        )
        .unwrap();
        let Statement::Insert(i) = stmt else { panic!("expected Insert") };
        assert_eq!(i.rows.len(), 2);
    }

    #[test]
    fn parses_array_type() {
        let stmt = parse_statement("CREATE TABLE t (tags STRING[])").unwrap();
        let Statement::CreateTable(t) = stmt else { panic!("expected CreateTable") };
        assert_eq!(t.columns[0].data_type, DataType::Array(Box::new(DataType::Text)));
    }

    #[test]
    fn parses_cast_expression_in_default() {
        let stmt = parse_statement("CREATE TABLE t (x INT DEFAULT CAST(1 AS INT8))").unwrap();
        let Statement::CreateTable(t) = stmt else { panic!("expected CreateTable") };
        assert!(matches!(t.columns[0].default, Some(Expr::Cast { .. })));
    }

    #[test]
    fn parses_trigger() {
        let stmt = parse_statement(
            "CREATE TRIGGER set_updated_at BEFORE UPDATE ON users FOR EACH ROW EXECUTE FUNCTION touch_updated_at()",
        )
        .unwrap();
        let Statement::CreateTrigger(t) = stmt else { panic!("expected CreateTrigger") };
        assert_eq!(t.table.name, "users");
        assert_eq!(t.function.name, "touch_updated_at");
    }
}
