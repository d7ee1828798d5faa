use crate::ast::{
    Declaration, EnumDecl, EnumValue, Field, ModelDecl, Modifiers, Schema, Type,
};
use crate::error::CompileError;
use crate::lexer::{Keyword, Lexer, Punct, Token, TokenKind};
use crate::utils::quote;

/// Recursive-descent parser with one token of look-ahead.
///
/// Parsing is fail-fast: the first mismatch aborts with a
/// `CompileError::Parse` carrying the offending location. Modifier
/// compatibility, number ranges and type resolution are left to the
/// validator.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Parser<'a> {
        let current = lexer.next_token();
        Parser { lexer, current }
    }

    pub fn parse_schema(&mut self) -> Result<Schema, CompileError> {
        let location = self.current.location;
        let namespace = self.parse_namespace()?;

        let mut declarations = Vec::new();
        while !self.check(TokenKind::Eof) {
            declarations.push(self.parse_declaration()?);
        }

        Ok(Schema {
            namespace,
            declarations,
            location,
        })
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, CompileError> {
        if !self.check(kind) {
            return Err(self.error(message));
        }
        let token = self.current.clone();
        self.advance();
        Ok(token)
    }

    fn error(&self, message: &str) -> CompileError {
        CompileError::Parse {
            msg: message.to_string(),
            line: self.current.location.line,
            column: self.current.location.column,
        }
    }

    fn parse_namespace(&mut self) -> Result<String, CompileError> {
        self.consume(
            TokenKind::Keyword(Keyword::Namespace),
            "Expected 'namespace' at the beginning of file",
        )?;

        let mut name = self
            .consume(TokenKind::Identifier, "Expected namespace name")?
            .text;

        while self.eat(TokenKind::Punct(Punct::Dot)) {
            name.push('.');
            name.push_str(
                &self
                    .consume(TokenKind::Identifier, "Expected identifier after '.'")?
                    .text,
            );
        }

        self.consume(
            TokenKind::Punct(Punct::Semicolon),
            "Expected ';' after namespace declaration",
        )?;

        Ok(name)
    }

    fn parse_declaration(&mut self) -> Result<Declaration, CompileError> {
        if self.check(TokenKind::Keyword(Keyword::Enum)) {
            Ok(Declaration::Enum(self.parse_enum()?))
        } else if self.check(TokenKind::Keyword(Keyword::Model)) {
            Ok(Declaration::Model(self.parse_model()?))
        } else {
            Err(self.error("Expected 'enum' or 'model' declaration"))
        }
    }

    fn parse_enum(&mut self) -> Result<EnumDecl, CompileError> {
        let location = self.current.location;
        self.consume(TokenKind::Keyword(Keyword::Enum), "Expected 'enum'")?;

        let name = self
            .consume(TokenKind::Identifier, "Expected enum name")?
            .text;
        self.consume(
            TokenKind::Punct(Punct::LBrace),
            "Expected '{' after enum name",
        )?;

        let mut values = Vec::new();
        while !self.check(TokenKind::Punct(Punct::RBrace)) && !self.check(TokenKind::Eof) {
            let value_location = self.current.location;
            let value_name = self
                .consume(TokenKind::Identifier, "Expected enum value name")?
                .text;

            self.consume(
                TokenKind::Punct(Punct::Equals),
                "Expected '=' after enum value name",
            )?;

            let number_token = self.consume(TokenKind::Number, "Expected number after '='")?;
            let value = parse_number(&number_token)?;

            self.consume(
                TokenKind::Punct(Punct::Semicolon),
                "Expected ';' after enum value",
            )?;

            values.push(EnumValue {
                name: value_name,
                value,
                location: value_location,
            });
        }

        self.consume(
            TokenKind::Punct(Punct::RBrace),
            "Expected '}' after enum body",
        )?;

        Ok(EnumDecl {
            name,
            values,
            location,
        })
    }

    fn parse_model(&mut self) -> Result<ModelDecl, CompileError> {
        let location = self.current.location;
        self.consume(TokenKind::Keyword(Keyword::Model), "Expected 'model'")?;

        let name = self
            .consume(TokenKind::Identifier, "Expected model name")?
            .text;
        self.consume(
            TokenKind::Punct(Punct::LBrace),
            "Expected '{' after model name",
        )?;

        let mut fields = Vec::new();
        while !self.check(TokenKind::Punct(Punct::RBrace)) && !self.check(TokenKind::Eof) {
            fields.push(self.parse_field()?);
        }

        self.consume(
            TokenKind::Punct(Punct::RBrace),
            "Expected '}' after model body",
        )?;

        Ok(ModelDecl {
            name,
            fields,
            location,
        })
    }

    fn parse_field(&mut self) -> Result<Field, CompileError> {
        let location = self.current.location;

        let modifiers = self.parse_modifiers();
        let ty = self.parse_type()?;

        let name = self
            .consume(TokenKind::Identifier, "Expected field name")?
            .text;

        self.consume(
            TokenKind::Punct(Punct::Equals),
            "Expected '=' after field name",
        )?;

        let number_token = self.consume(TokenKind::Number, "Expected field number")?;
        let number = parse_number(&number_token)?;

        self.consume(
            TokenKind::Punct(Punct::Semicolon),
            "Expected ';' after field declaration",
        )?;

        Ok(Field {
            ty,
            name,
            number,
            modifiers,
            location,
        })
    }

    fn parse_type(&mut self) -> Result<Type, CompileError> {
        let location = self.current.location;

        if let TokenKind::Primitive(kind) = self.current.kind {
            self.advance();
            Ok(Type::Primitive { kind, location })
        } else if self.check(TokenKind::Identifier) {
            let name = self.current.text.clone();
            self.advance();
            Ok(Type::UserRef { name, location })
        } else {
            Err(self.error("Expected type name"))
        }
    }

    // Duplicated modifiers are absorbed by the bitset.
    fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::none();

        loop {
            let flag = match self.current.kind {
                TokenKind::Keyword(Keyword::Optional) => Modifiers::OPTIONAL,
                TokenKind::Keyword(Keyword::Repeated) => Modifiers::REPEATED,
                TokenKind::Keyword(Keyword::Packed) => Modifiers::PACKED,
                TokenKind::Keyword(Keyword::Interned) => Modifiers::INTERNED,
                TokenKind::Keyword(Keyword::Bitmap) => Modifiers::BITMAP,
                _ => break,
            };
            modifiers.insert(flag);
            self.advance();
        }

        modifiers
    }
}

fn parse_number(token: &Token) -> Result<i64, CompileError> {
    token.text.parse::<i64>().map_err(|_| CompileError::Parse {
        msg: format!("Invalid integer {}", quote(&token.text)),
        line: token.location.line,
        column: token.location.column,
    })
}
