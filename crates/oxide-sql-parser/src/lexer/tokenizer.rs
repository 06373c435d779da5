//! SQL Tokenizer implementation.

use super::{Keyword, Span, Token, TokenKind};

/// A lexer that tokenizes SQL input.
///
/// Tokens borrow their text from the input. Invalid input never stops the
/// lexer: it yields a [`TokenKind::Error`] token and carries on, leaving the
/// decision to the parser.
pub struct Lexer<'s> {
    /// The input source code.
    input: &'s str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
    /// Current 1-based line.
    line: u32,
    /// Byte offset where the current line begins.
    line_start: usize,
    /// Line and column of the current token's first byte.
    start_line: u32,
    start_column: u32,
}

impl<'s> Lexer<'s> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'s str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
            line: 1,
            line_start: 0,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    /// Skips whitespace and comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.advance_while(char::is_whitespace);

            // Skip single-line comments (-- ...)
            if self.peek() == Some('-') && self.peek_next() == Some('-') {
                self.advance_while(|c| c != '\n');
                continue;
            }

            // Skip multi-line comments (/* ... */)
            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                self.advance(); // /
                self.advance(); // *
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

    /// Creates a token spanning from the token start to the current position.
    fn make_token(&self, kind: TokenKind) -> Token<'s> {
        Token::new(
            kind,
            &self.input[self.start..self.pos],
            Span::new(self.start, self.pos),
            self.start_line,
            self.start_column,
        )
    }

    fn is_ident_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_' || c == '$'
    }

    /// Scans an identifier or keyword.
    fn scan_identifier(&mut self) -> Token<'s> {
        self.advance_while(Self::is_ident_char);
        let text = &self.input[self.start..self.pos];
        match Keyword::from_str(text) {
            Some(keyword) => self.make_token(TokenKind::Keyword(keyword)),
            None => self.make_token(TokenKind::Identifier),
        }
    }

    /// Scans a quoted span closed by `close`, where a doubled closing
    /// character stands for itself. The opening character is consumed.
    fn scan_quoted(&mut self, close: char, kind: TokenKind, unterminated: &'static str) -> Token<'s> {
        loop {
            match self.advance() {
                Some(c) if c == close => {
                    if self.peek() == Some(close) {
                        self.advance();
                    } else {
                        return self.make_token(kind);
                    }
                }
                Some(_) => {}
                None => return self.make_token(TokenKind::Error(unterminated)),
            }
        }
    }

    /// Scans a number (integer or float).
    fn scan_number(&mut self) -> Token<'s> {
        let mut is_float = false;

        if self.peek() == Some('0') && matches!(self.peek_next(), Some('x' | 'X')) {
            self.advance();
            self.advance();
            let digits = self.pos;
            self.advance_while(|c| c.is_ascii_hexdigit());
            if self.pos == digits {
                return self.make_token(TokenKind::Error("Invalid hexadecimal literal"));
            }
            return self.make_token(TokenKind::Integer);
        }

        self.advance_while(|c| c.is_ascii_digit());

        // Check for decimal point
        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
        }

        // Check for exponent
        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            is_float = true;
            self.advance();
            if self.peek().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            let digits = self.pos;
            self.advance_while(|c| c.is_ascii_digit());
            if self.pos == digits {
                return self.make_token(TokenKind::Error("Invalid float: missing exponent"));
            }
        }

        if self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
            self.advance_while(Self::is_ident_char);
            return self.make_token(TokenKind::Error("Invalid number literal"));
        }

        if is_float {
            self.make_token(TokenKind::Float)
        } else {
            self.make_token(TokenKind::Integer)
        }
    }

    /// Scans a blob literal (X'...' or x'...'). The X has been consumed.
    fn scan_blob(&mut self) -> Token<'s> {
        self.advance(); // consume opening quote
        let digits = self.pos;
        loop {
            match self.peek() {
                Some('\'') => break,
                Some(c) if c.is_ascii_hexdigit() => {
                    self.advance();
                }
                Some(_) => {
                    self.advance_while(|c| c != '\'');
                    self.advance();
                    return self.make_token(TokenKind::Error("Invalid character in blob literal"));
                }
                None => return self.make_token(TokenKind::Error("Unterminated blob literal")),
            }
        }
        let odd = (self.pos - digits) % 2 == 1;
        self.advance(); // consume closing quote
        if odd {
            return self.make_token(TokenKind::Error(
                "Odd number of hex digits in blob literal",
            ));
        }
        self.make_token(TokenKind::Blob)
    }

    /// Scans a named or numbered parameter after its sigil.
    fn scan_parameter(&mut self, sigil: char) -> Token<'s> {
        let body = self.pos;
        if sigil == '?' {
            self.advance_while(|c| c.is_ascii_digit());
            return self.make_token(TokenKind::Parameter);
        }
        self.advance_while(Self::is_ident_char);
        if self.pos == body {
            return self.make_token(TokenKind::Error("Parameter name expected"));
        }
        self.make_token(TokenKind::Parameter)
    }

    /// Scans the next token, or returns `None` at the end of input.
    pub fn next_token(&mut self) -> Option<Token<'s>> {
        self.skip_whitespace_and_comments();
        self.start = self.pos;
        self.start_line = self.line;
        self.start_column = u32::try_from(self.pos - self.line_start + 1).unwrap_or(u32::MAX);

        let c = self.advance()?;

        let token = match c {
            // Single-character tokens
            '(' => self.make_token(TokenKind::LeftParen),
            ')' => self.make_token(TokenKind::RightParen),
            ',' => self.make_token(TokenKind::Comma),
            ';' => self.make_token(TokenKind::Semicolon),
            '+' => self.make_token(TokenKind::Plus),
            '-' => self.make_token(TokenKind::Minus),
            '*' => self.make_token(TokenKind::Star),
            '/' => self.make_token(TokenKind::Slash),
            '%' => self.make_token(TokenKind::Percent),
            '~' => self.make_token(TokenKind::BitNot),
            '^' => self.make_token(TokenKind::BitXor),
            '&' => self.make_token(TokenKind::BitAnd),

            // Parameters
            '?' | ':' | '@' | '$' => {
                if c == ':' && self.peek() == Some(':') {
                    self.advance();
                    self.make_token(TokenKind::DoubleColon)
                } else {
                    self.scan_parameter(c)
                }
            }

            // Potentially multi-character tokens
            '.' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos = self.start;
                    self.scan_number()
                } else {
                    self.make_token(TokenKind::Dot)
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                }
                self.make_token(TokenKind::Eq)
            }
            '<' => match self.peek() {
                Some('=') => {
                    self.advance();
                    self.make_token(TokenKind::LtEq)
                }
                Some('>') => {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                }
                Some('<') => {
                    self.advance();
                    self.make_token(TokenKind::LeftShift)
                }
                _ => self.make_token(TokenKind::Lt),
            },
            '>' => match self.peek() {
                Some('=') => {
                    self.advance();
                    self.make_token(TokenKind::GtEq)
                }
                Some('>') => {
                    self.advance();
                    self.make_token(TokenKind::RightShift)
                }
                _ => self.make_token(TokenKind::Gt),
            },
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                } else {
                    self.make_token(TokenKind::Error("Unexpected character: !"))
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

            // String literals
            '\'' => self.scan_quoted('\'', TokenKind::String, "Unterminated string literal"),

            // Quoted identifiers
            '"' => self.scan_quoted(
                '"',
                TokenKind::QuotedIdentifier,
                "Unterminated quoted identifier",
            ),
            '`' => self.scan_quoted(
                '`',
                TokenKind::QuotedIdentifier,
                "Unterminated quoted identifier",
            ),
            '[' => self.scan_quoted(
                ']',
                TokenKind::QuotedIdentifier,
                "Unterminated quoted identifier",
            ),

            // Blob literals
            'X' | 'x' if self.peek() == Some('\'') => self.scan_blob(),

            // Numbers
            c if c.is_ascii_digit() => {
                self.pos = self.start;
                self.scan_number()
            }

            // Identifiers and keywords
            c if c.is_alphabetic() || c == '_' => self.scan_identifier(),

            _ => self.make_token(TokenKind::Error("Unexpected character")),
        };
        Some(token)
    }

    /// Tokenizes the entire input and returns all tokens.
    #[must_use]
    pub fn tokenize(self) -> Vec<Token<'s>> {
        self.collect()
    }
}

impl<'s> Iterator for Lexer<'s> {
    type Item = Token<'s>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}
