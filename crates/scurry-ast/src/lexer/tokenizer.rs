//! Hand-written DDL tokenizer.

use super::{Keyword, Span, Token, TokenKind};

/// A lexer that tokenizes DDL/expression source text.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            if self.peek() == Some('-') && self.peek_next() == Some('-') {
                self.advance();
                self.advance();
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                continue;
            }

            break;
        }
    }

    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    fn scan_identifier(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let text = &self.input[self.start..self.pos];

        if let Some(keyword) = Keyword::from_str(text) {
            self.make_token(TokenKind::Keyword(keyword))
        } else {
            self.make_token(TokenKind::Identifier(text.to_string()))
        }
    }

    fn scan_quoted_identifier(&mut self, quote: char) -> Token {
        self.advance();
        let content_start = self.pos;

        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    if self.peek_next() == Some(quote) {
                        self.advance();
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(_) => {
                    self.advance();
                }
                None => {
                    return self
                        .make_token(TokenKind::Error("unterminated quoted identifier".into()));
                }
            }
        }

        let content = &self.input[content_start..self.pos];
        self.advance();

        let doubled = format!("{quote}{quote}");
        let unescaped = content.replace(&doubled, &quote.to_string());
        self.make_token(TokenKind::Identifier(unescaped))
    }

    fn scan_number(&mut self) -> Token {
        let mut is_float = false;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            is_float = true;
            self.advance();
            if self.peek().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = &self.input[self.start..self.pos];

        if is_float {
            match text.parse::<f64>() {
                Ok(f) => self.make_token(TokenKind::Float(f)),
                Err(e) => self.make_token(TokenKind::Error(format!("invalid float: {e}"))),
            }
        } else {
            match text.parse::<i64>() {
                Ok(i) => self.make_token(TokenKind::Integer(i)),
                Err(e) => self.make_token(TokenKind::Error(format!("invalid integer: {e}"))),
            }
        }
    }

    fn scan_string(&mut self, quote: char) -> Token {
        self.advance();
        let mut value = String::new();

        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    if self.peek_next() == Some(quote) {
                        value.push(quote);
                        self.advance();
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
                None => {
                    return self.make_token(TokenKind::Error("unterminated string literal".into()));
                }
            }
        }

        self.advance();
        self.make_token(TokenKind::String(value))
    }

    /// Scans a dollar-quoted string, e.g. `$$body$$` or `$tag$body$tag$`,
    /// the way CockroachDB/Postgres routine and trigger bodies are written.
    fn scan_dollar_quoted(&mut self) -> Token {
        self.advance(); // consume opening $
        let tag_start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let tag = self.input[tag_start..self.pos].to_string();
        if self.peek() != Some('$') {
            return self.make_token(TokenKind::Error("malformed dollar quote tag".into()));
        }
        self.advance(); // consume closing $ of opening delimiter

        let body_start = self.pos;
        let delimiter = format!("${tag}$");

        loop {
            if self.input[self.pos..].starts_with(delimiter.as_str()) {
                let body = self.input[body_start..self.pos].to_string();
                for _ in 0..delimiter.chars().count() {
                    self.advance();
                }
                return self.make_token(TokenKind::DollarQuotedString(body));
            }
            if self.advance().is_none() {
                return self.make_token(TokenKind::Error("unterminated dollar-quoted string".into()));
            }
        }
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start = self.pos;

        let c = match self.advance() {
            Some(c) => c,
            None => return self.make_token(TokenKind::Eof),
        };

        match c {
            '(' => self.make_token(TokenKind::LeftParen),
            ')' => self.make_token(TokenKind::RightParen),
            '[' => self.make_token(TokenKind::LeftBracket),
            ']' => self.make_token(TokenKind::RightBracket),
            ',' => self.make_token(TokenKind::Comma),
            ';' => self.make_token(TokenKind::Semicolon),
            '+' => self.make_token(TokenKind::Plus),
            '-' => self.make_token(TokenKind::Minus),
            '*' => self.make_token(TokenKind::Star),
            '/' => self.make_token(TokenKind::Slash),
            '%' => self.make_token(TokenKind::Percent),
            '~' => self.make_token(TokenKind::BitNot),
            '.' => self.make_token(TokenKind::Dot),
            ':' => {
                if self.peek() == Some(':') {
                    self.advance();
                    self.make_token(TokenKind::DoubleColon)
                } else {
                    self.make_token(TokenKind::Colon)
                }
            }
            '=' => self.make_token(TokenKind::Eq),
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::LtEq)
                } else if self.peek() == Some('>') {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                } else if self.peek() == Some('<') {
                    self.advance();
                    self.make_token(TokenKind::LeftShift)
                } else {
                    self.make_token(TokenKind::Lt)
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::GtEq)
                } else if self.peek() == Some('>') {
                    self.advance();
                    self.make_token(TokenKind::RightShift)
                } else {
                    self.make_token(TokenKind::Gt)
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                } else {
                    self.make_token(TokenKind::Error("unexpected character: !".into()))
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    self.make_token(TokenKind::Concat)
                } else {
                    self.make_token(TokenKind::BitOr)
                }
            }
            '&' => self.make_token(TokenKind::BitAnd),

            '\'' => {
                self.pos = self.start;
                self.scan_string('\'')
            }

            '"' => {
                self.pos = self.start;
                self.scan_quoted_identifier('"')
            }

            '$' => {
                self.pos = self.start;
                self.scan_dollar_quoted()
            }

            c if c.is_ascii_digit() => {
                self.pos = self.start;
                self.scan_number()
            }

            c if c.is_alphabetic() || c == '_' => {
                self.pos = self.start;
                self.scan_identifier()
            }

            _ => self.make_token(TokenKind::Error(format!("unexpected character: {c}"))),
        }
    }

    /// Tokenizes the entire input and returns all tokens, ending with `Eof`.
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input_yields_eof() {
        assert_eq!(token_kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            token_kinds("CREATE -- comment\nTABLE /* block */ foo"),
            vec![
                TokenKind::Keyword(Keyword::Create),
                TokenKind::Keyword(Keyword::Table),
                TokenKind::Identifier("foo".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            token_kinds("create TABLE Users"),
            vec![
                TokenKind::Keyword(Keyword::Create),
                TokenKind::Keyword(Keyword::Table),
                TokenKind::Identifier("Users".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn quoted_identifiers_preserve_case_and_unescape() {
        assert_eq!(
            token_kinds("\"My Table\" \"quo\"\"te\""),
            vec![
                TokenKind::Identifier("My Table".into()),
                TokenKind::Identifier("quo\"te".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            token_kinds("42 3.14 1e10 2.5e-3"),
            vec![
                TokenKind::Integer(42),
                TokenKind::Float(3.14),
                TokenKind::Float(1e10),
                TokenKind::Float(2.5e-3),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn double_colon_cast_operator() {
        assert_eq!(
            token_kinds("a::INT"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::DoubleColon,
                TokenKind::Keyword(Keyword::Int),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn dollar_quoted_function_body() {
        let tokens = token_kinds("$$ SELECT 1; $$");
        assert_eq!(
            tokens,
            vec![
                TokenKind::DollarQuotedString(" SELECT 1; ".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tagged_dollar_quoted_body_allows_nested_dollar() {
        let tokens = token_kinds("$body$ a $$ b $body$");
        assert_eq!(
            tokens,
            vec![
                TokenKind::DollarQuotedString(" a $$ b ".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_with_doubled_quote_escape() {
        assert_eq!(
            token_kinds("'it''s'"),
            vec![TokenKind::String("it's".into()), TokenKind::Eof]
        );
    }
}
