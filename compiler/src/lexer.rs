use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::ast::{PrimitiveKind, PRIMITIVE_KINDS};
use crate::diagnostics::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Namespace,
    Enum,
    Model,
    Optional,
    Repeated,
    Packed,
    Interned,
    Bitmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    Semicolon,
    Equals,
    LBrace,
    RBrace,
    Dot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Primitive(PrimitiveKind),
    Punct(Punct),
    Identifier,
    Number,
    Eof,
    Invalid,
}

impl TokenKind {
    /// A human-readable name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Keyword(Keyword::Namespace) => "'namespace'",
            TokenKind::Keyword(Keyword::Enum) => "'enum'",
            TokenKind::Keyword(Keyword::Model) => "'model'",
            TokenKind::Keyword(Keyword::Optional) => "'optional'",
            TokenKind::Keyword(Keyword::Repeated) => "'repeated'",
            TokenKind::Keyword(Keyword::Packed) => "'packed'",
            TokenKind::Keyword(Keyword::Interned) => "'interned'",
            TokenKind::Keyword(Keyword::Bitmap) => "'bitmap'",
            TokenKind::Primitive(kind) => kind.name(),
            TokenKind::Punct(Punct::Semicolon) => "';'",
            TokenKind::Punct(Punct::Equals) => "'='",
            TokenKind::Punct(Punct::LBrace) => "'{'",
            TokenKind::Punct(Punct::RBrace) => "'}'",
            TokenKind::Punct(Punct::Dot) => "'.'",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::Eof => "end of file",
            TokenKind::Invalid => "invalid token",
        }
    }
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut table = HashMap::new();
        table.insert("namespace", TokenKind::Keyword(Keyword::Namespace));
        table.insert("enum", TokenKind::Keyword(Keyword::Enum));
        table.insert("model", TokenKind::Keyword(Keyword::Model));
        table.insert("optional", TokenKind::Keyword(Keyword::Optional));
        table.insert("repeated", TokenKind::Keyword(Keyword::Repeated));
        table.insert("packed", TokenKind::Keyword(Keyword::Packed));
        table.insert("interned", TokenKind::Keyword(Keyword::Interned));
        table.insert("bitmap", TokenKind::Keyword(Keyword::Bitmap));
        for kind in PRIMITIVE_KINDS {
            table.insert(kind.name(), TokenKind::Primitive(kind));
        }
        table
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: SourceLocation) -> Token {
        Token {
            kind,
            text: text.into(),
            location,
        }
    }
}

/// A cursor-based scanner with a single token of look-ahead.
///
/// Only the ASCII subset of the input is significant: identifiers are ASCII
/// letters, digits and underscores, and columns advance one per byte.
pub struct Lexer<'a> {
    source: &'a [u8],
    position: usize,
    line: usize,
    column: usize,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            source: source.as_bytes(),
            position: 0,
            line: 1,
            column: 1,
            peeked: None,
        }
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Token {
        if let Some(token) = self.peeked.take() {
            token
        } else {
            self.scan_token()
        }
    }

    /// Returns the next token without consuming it. Idempotent until
    /// `next_token` is called.
    pub fn peek_token(&mut self) -> Token {
        if let Some(token) = &self.peeked {
            token.clone()
        } else {
            let token = self.scan_token();
            self.peeked = Some(token.clone());
            token
        }
    }

    pub fn has_more_tokens(&self) -> bool {
        self.peeked.is_some() || self.position < self.source.len()
    }

    pub fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.position)
    }

    /// Formats a one-line diagnostic anchored at `location`.
    pub fn format_error(&self, message: &str, location: SourceLocation) -> String {
        format!(
            "Error at line {}, column {}: {}",
            location.line, location.column, message
        )
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let location = self.current_location();

        if self.is_at_end() {
            return Token::new(TokenKind::Eof, "", location);
        }

        let c = self.current_char();

        match c {
            b';' => self.punct(Punct::Semicolon, ";", location),
            b'=' => self.punct(Punct::Equals, "=", location),
            b'{' => self.punct(Punct::LBrace, "{", location),
            b'}' => self.punct(Punct::RBrace, "}", location),
            b'.' => self.punct(Punct::Dot, ".", location),
            b'-' => {
                if self.peek_char(1).is_ascii_digit() {
                    self.read_number(location)
                } else {
                    self.advance();
                    Token::new(TokenKind::Invalid, "-", location)
                }
            }
            _ if is_identifier_start(c) => self.read_identifier_or_keyword(location),
            _ if c.is_ascii_digit() => self.read_number(location),
            _ => {
                self.advance();
                Token::new(TokenKind::Invalid, (c as char).to_string(), location)
            }
        }
    }

    fn punct(&mut self, punct: Punct, text: &str, location: SourceLocation) -> Token {
        self.advance();
        Token::new(TokenKind::Punct(punct), text, location)
    }

    fn current_char(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.position]
        }
    }

    fn peek_char(&self, offset: usize) -> u8 {
        let pos = self.position + offset;
        if pos >= self.source.len() {
            0
        } else {
            self.source[pos]
        }
    }

    fn advance(&mut self) {
        if self.is_at_end() {
            return;
        }

        let c = self.source[self.position];
        self.position += 1;

        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    fn skip_whitespace_and_comments(&mut self) {
        while !self.is_at_end() {
            let c = self.current_char();

            if c.is_ascii_whitespace() {
                self.advance();
                continue;
            }

            if c == b'/' && self.peek_char(1) == b'/' {
                self.skip_line_comment();
                continue;
            }

            if c == b'/' && self.peek_char(1) == b'*' {
                self.skip_block_comment();
                continue;
            }

            break;
        }
    }

    fn skip_line_comment(&mut self) {
        self.advance();
        self.advance();

        while !self.is_at_end() && self.current_char() != b'\n' {
            self.advance();
        }
    }

    // Block comments do not nest; an unterminated comment consumes the rest
    // of the input.
    fn skip_block_comment(&mut self) {
        self.advance();
        self.advance();

        while !self.is_at_end() {
            if self.current_char() == b'*' && self.peek_char(1) == b'/' {
                self.advance();
                self.advance();
                break;
            }
            self.advance();
        }
    }

    fn read_identifier_or_keyword(&mut self, location: SourceLocation) -> Token {
        let start = self.position;

        while !self.is_at_end() && is_identifier_continue(self.current_char()) {
            self.advance();
        }

        let text = String::from_utf8_lossy(&self.source[start..self.position]).into_owned();
        let kind = KEYWORDS
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, location)
    }

    fn read_number(&mut self, location: SourceLocation) -> Token {
        let start = self.position;

        if self.current_char() == b'-' {
            self.advance();
        }

        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            self.advance();
        }

        let text = String::from_utf8_lossy(&self.source[start..self.position]).into_owned();
        Token::new(TokenKind::Number, text, location)
    }
}

fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_identifier_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            let kind = token.kind;
            out.push(kind);
            if kind == TokenKind::Eof {
                return out;
            }
        }
    }

    #[test]
    fn scans_a_minimal_schema() {
        let mut lexer = Lexer::new("namespace demo;");
        let first = lexer.next_token();
        assert_eq!(first.kind, TokenKind::Keyword(Keyword::Namespace));
        assert_eq!(first.text, "namespace");
        assert_eq!((first.location.line, first.location.column), (1, 1));

        let second = lexer.next_token();
        assert_eq!(second.kind, TokenKind::Identifier);
        assert_eq!(second.text, "demo");
        assert_eq!(second.location.column, 11);

        let third = lexer.next_token();
        assert_eq!(third.kind, TokenKind::Punct(Punct::Semicolon));
        assert_eq!(third.location.column, 15);

        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn recognizes_keywords_and_primitives() {
        assert_eq!(
            kinds("model optional repeated packed interned bitmap"),
            vec![
                TokenKind::Keyword(Keyword::Model),
                TokenKind::Keyword(Keyword::Optional),
                TokenKind::Keyword(Keyword::Repeated),
                TokenKind::Keyword(Keyword::Packed),
                TokenKind::Keyword(Keyword::Interned),
                TokenKind::Keyword(Keyword::Bitmap),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("uint32 double byte Widget"),
            vec![
                TokenKind::Primitive(PrimitiveKind::UInt32),
                TokenKind::Primitive(PrimitiveKind::Double),
                TokenKind::Primitive(PrimitiveKind::Byte),
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn peek_is_idempotent() {
        let mut lexer = Lexer::new("enum Color");
        assert_eq!(lexer.peek_token().kind, TokenKind::Keyword(Keyword::Enum));
        assert_eq!(lexer.peek_token().kind, TokenKind::Keyword(Keyword::Enum));
        assert_eq!(lexer.next_token().kind, TokenKind::Keyword(Keyword::Enum));
        assert_eq!(lexer.peek_token().text, "Color");
        assert_eq!(lexer.next_token().text, "Color");
    }

    #[test]
    fn comments_do_not_change_the_token_stream() {
        let plain = kinds("namespace a; model M { bool b = 1; }");
        let commented = kinds(
            "// leading\nnamespace a; /* inline */ model M {\n  bool b = 1; // trailing\n}",
        );
        assert_eq!(plain, commented);
    }

    #[test]
    fn newline_resets_column() {
        let mut lexer = Lexer::new("enum\n  Color");
        lexer.next_token();
        let token = lexer.next_token();
        assert_eq!((token.location.line, token.location.column), (2, 3));
        assert_eq!(token.location.offset, 7);
    }

    #[test]
    fn negative_numbers_and_bare_minus() {
        let mut lexer = Lexer::new("-12 -");
        let number = lexer.next_token();
        assert_eq!(number.kind, TokenKind::Number);
        assert_eq!(number.text, "-12");

        let minus = lexer.next_token();
        assert_eq!(minus.kind, TokenKind::Invalid);
        assert_eq!(minus.text, "-");
    }

    #[test]
    fn stray_characters_become_invalid_tokens() {
        let mut lexer = Lexer::new("@ model");
        let stray = lexer.next_token();
        assert_eq!(stray.kind, TokenKind::Invalid);
        assert_eq!(stray.text, "@");
        assert_eq!(lexer.next_token().kind, TokenKind::Keyword(Keyword::Model));
    }

    #[test]
    fn unterminated_block_comment_consumes_to_eof() {
        let mut lexer = Lexer::new("model /* never closed");
        assert_eq!(lexer.next_token().kind, TokenKind::Keyword(Keyword::Model));
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn format_error_includes_location() {
        let lexer = Lexer::new("");
        let message = lexer.format_error("Unexpected token", SourceLocation::new(4, 9, 30));
        assert_eq!(message, "Error at line 4, column 9: Unexpected token");
    }
}
