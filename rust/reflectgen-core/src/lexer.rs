use crate::error::LexError;
use crate::token::{Token, TokenKind};

/// Output of one tokenizer pass. `tokens` always ends with a single
/// end-of-file token, even when `errors` is non-empty.
#[derive(Debug, Clone)]
pub struct Tokenized {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl Tokenized {
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<Token>, Vec<LexError>> {
        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }
}

/// Scan `source` left to right into a flat token sequence.
pub fn tokenize(source: &str) -> Tokenized {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    cursor: usize,
    line: usize,
    column: usize,
    errors: Vec<LexError>,
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            cursor: 0,
            line: 1,
            column: 1,
            errors: Vec::new(),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = *self.chars.get(self.cursor)?;
        self.cursor += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.cursor + n).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek(0) == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn digit_at(&self, n: usize) -> bool {
        self.peek(n).is_some_and(|c| c.is_ascii_digit())
    }

    fn signed_digit_at(&self, n: usize) -> bool {
        self.digit_at(n) || (matches!(self.peek(n), Some('+' | '-')) && self.digit_at(n + 1))
    }

    fn exponent_at(&self, n: usize) -> bool {
        matches!(self.peek(n), Some('e' | 'E')) && self.signed_digit_at(n + 1)
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek(0).is_some_and(&pred) {
            self.advance();
        }
    }
}

// ----------------------------------------------------------------------------
// Scanner
// ----------------------------------------------------------------------------

impl Lexer {
    fn run(mut self) -> Tokenized {
        let mut tokens = Vec::new();
        loop {
            let (line, column, start) = (self.line, self.column, self.cursor);
            let Some(c) = self.advance() else { break };

            let kind = self.scan(c, start, line, column);
            if matches!(kind, TokenKind::Ignore | TokenKind::Error) {
                continue;
            }
            let text: String = self.chars[start..self.cursor].iter().collect();
            tokens.push(Token::new(line, column, kind, text));
        }
        tokens.push(Token::new(self.line, self.column, TokenKind::EndOfFile, "EOF"));

        Tokenized {
            tokens,
            errors: self.errors,
        }
    }

    fn scan(&mut self, c: char, start: usize, line: usize, column: usize) -> TokenKind {
        if let Some(kind) = TokenKind::single_char(c) {
            return kind;
        }
        match c {
            '/' => {
                if self.eat('/') {
                    self.skip_while(|c| c != '\n');
                } else if self.eat('*') {
                    self.skip_block_comment();
                }
                TokenKind::Ignore
            }
            '"' => self.string_literal(line, column),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(start),
            c if c.is_ascii_digit() => self.number_literal(line, column),
            // whitespace and anything unrecognised
            _ => TokenKind::Ignore,
        }
    }

    fn skip_block_comment(&mut self) {
        while let Some(c) = self.advance() {
            if c == '*' && self.eat('/') {
                return;
            }
        }
    }

    fn string_literal(&mut self, line: usize, column: usize) -> TokenKind {
        loop {
            match self.advance() {
                None => {
                    self.errors.push(LexError::UnterminatedString { line, column });
                    return TokenKind::Error;
                }
                Some('"') => return TokenKind::StringLiteral,
                Some('\\') => {
                    self.advance();
                }
                Some(_) => {}
            }
        }
    }

    fn identifier(&mut self, start: usize) -> TokenKind {
        self.skip_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let text: String = self.chars[start..self.cursor].iter().collect();
        TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier)
    }

    fn number_literal(&mut self, line: usize, column: usize) -> TokenKind {
        self.skip_while(|c| c.is_ascii_digit());

        // A '.' not followed by a digit or an exponent is left for the next
        // token (member access, stray punctuation).
        if self.peek(0) == Some('.') && (self.digit_at(1) || self.exponent_at(1)) {
            self.advance();
            self.skip_while(|c| c.is_ascii_digit());
        }

        if self.exponent_at(0) {
            self.advance();
            if matches!(self.peek(0), Some('+' | '-')) {
                self.advance();
            }
            self.skip_while(|c| c.is_ascii_digit());

            if self.peek(0) == Some('.') {
                self.errors.push(LexError::MalformedNumber { line, column });
                return TokenKind::Error;
            }
        }

        // literal suffixes: 1.0f, 10u, 0xFF
        self.skip_while(|c| c.is_ascii_alphanumeric() || c == '_');
        TokenKind::NumberLiteral
    }
}
