use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    ComponentMarker,
    StructKw,
    ClassKw,
    PublicKw,
    ProtectedKw,
    PrivateKw,
    NamespaceKw,
    Ampersand,
    Asterisk,
    Colon,
    LeftParen,
    RightParen,
    Hash,
    LeftBrace,
    RightBrace,
    Semicolon,
    Equals,
    Identifier,
    StringLiteral,
    NumberLiteral,
    Greater,
    Less,
    TrueKw,
    FalseKw,
    EndOfFile,
    // Scanner-internal results, never stored in a token sequence.
    Ignore,
    Error,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::ComponentMarker => "COMPONENT_MARKER",
            TokenKind::StructKw => "STRUCT_KW",
            TokenKind::ClassKw => "CLASS_KW",
            TokenKind::PublicKw => "PUBLIC_KW",
            TokenKind::ProtectedKw => "PROTECTED_KW",
            TokenKind::PrivateKw => "PRIVATE_KW",
            TokenKind::NamespaceKw => "NAMESPACE_KW",
            TokenKind::Ampersand => "AMPERSAND",
            TokenKind::Asterisk => "ASTERISK",
            TokenKind::Colon => "COLON",
            TokenKind::LeftParen => "LEFT_PAREN",
            TokenKind::RightParen => "RIGHT_PAREN",
            TokenKind::Hash => "HASH",
            TokenKind::LeftBrace => "LEFT_BRACE",
            TokenKind::RightBrace => "RIGHT_BRACE",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Equals => "EQUALS",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::StringLiteral => "STRING_LITERAL",
            TokenKind::NumberLiteral => "NUMBER_LITERAL",
            TokenKind::Greater => "GREATER",
            TokenKind::Less => "LESS",
            TokenKind::TrueKw => "TRUE_KW",
            TokenKind::FalseKw => "FALSE_KW",
            TokenKind::EndOfFile => "END_OF_FILE",
            TokenKind::Ignore => "IGNORE",
            TokenKind::Error => "ERROR",
        }
    }

    /// Reserved words recognised by the scanner. Anything else spelled like
    /// an identifier stays an identifier.
    pub fn keyword(text: &str) -> Option<TokenKind> {
        match text {
            "Component" => Some(TokenKind::ComponentMarker),
            "public" => Some(TokenKind::PublicKw),
            "protected" => Some(TokenKind::ProtectedKw),
            "private" => Some(TokenKind::PrivateKw),
            "namespace" => Some(TokenKind::NamespaceKw),
            "class" => Some(TokenKind::ClassKw),
            "struct" => Some(TokenKind::StructKw),
            // Boolean literals are not record keywords; they get their own
            // kinds so they are never taken as a field name.
            "true" => Some(TokenKind::TrueKw),
            "false" => Some(TokenKind::FalseKw),
            _ => None,
        }
    }

    pub fn single_char(c: char) -> Option<TokenKind> {
        match c {
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            '{' => Some(TokenKind::LeftBrace),
            '}' => Some(TokenKind::RightBrace),
            ';' => Some(TokenKind::Semicolon),
            '=' => Some(TokenKind::Equals),
            ':' => Some(TokenKind::Colon),
            '&' => Some(TokenKind::Ampersand),
            '*' => Some(TokenKind::Asterisk),
            '>' => Some(TokenKind::Greater),
            '<' => Some(TokenKind::Less),
            '#' => Some(TokenKind::Hash),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lexeme with the 1-based position of its first character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub line: usize,
    pub column: usize,
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(line: usize, column: usize, kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            line,
            column,
            kind,
            text: text.into(),
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
