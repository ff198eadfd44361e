use crate::analysis::RawMethodSpec;
use crate::error::DoubleError;
use crate::syntax::token::{Token, TokenKind};

/// A parsed double target: `[Name:]Original[ [method, static:method, …] ]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleTarget {
    /// Explicit name for the double, if one was given before the colon.
    pub name:     Option<String>,
    pub original: String,
    pub methods:  Vec<RawMethodSpec>,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse_target(mut self) -> Result<DoubleTarget, DoubleError> {
        let first = self.parse_type_name()?;
        let (name, original) = if self.matches(TokenKind::Colon) {
            (Some(first), self.parse_type_name()?)
        } else {
            (None, first)
        };

        let methods = if self.check(TokenKind::LBracket) {
            self.parse_method_list()?
        } else {
            Vec::new()
        };

        if !self.is_at_end() {
            return Err(self.unexpected("`[` or end of input"));
        }
        Ok(DoubleTarget { name, original, methods })
    }

    /// A lone method spec, as passed to `add_method`.
    pub fn parse_method_spec(mut self) -> Result<RawMethodSpec, DoubleError> {
        let spec = self.parse_method()?;
        if !self.is_at_end() {
            return Err(self.unexpected("end of input"));
        }
        Ok(spec)
    }

    // ─── Names ───────────────────────────────────────────────────────────────

    /// `\`-separated segments; a leading `\` is allowed and dropped.
    fn parse_type_name(&mut self) -> Result<String, DoubleError> {
        self.matches(TokenKind::Backslash);
        let mut segments = vec![self.expect_ident("type name")?];
        while self.matches(TokenKind::Backslash) {
            segments.push(self.expect_ident("type name segment")?);
        }
        Ok(segments.join("\\"))
    }

    // ─── Methods ─────────────────────────────────────────────────────────────

    fn parse_method_list(&mut self) -> Result<Vec<RawMethodSpec>, DoubleError> {
        self.expect(TokenKind::LBracket)?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RBracket) && !self.is_at_end() {
            methods.push(self.parse_method()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(methods)
    }

    fn parse_method(&mut self) -> Result<RawMethodSpec, DoubleError> {
        let is_static = if self.matches(TokenKind::Static) {
            self.expect(TokenKind::Colon)?;
            true
        } else {
            false
        };
        let name = self.expect_ident("method name")?;
        Ok(RawMethodSpec { name, is_static })
    }

    // ─── Helpers ─────────────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, DoubleError> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, DoubleError> {
        match &self.peek().kind {
            TokenKind::Ident(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn unexpected(&self, expected: &str) -> DoubleError {
        let tok = self.peek();
        DoubleError::InvalidArgument(format!(
            "expected {expected} at column {} of double target, found {}",
            tok.column,
            tok.kind.describe()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;

    fn parse(src: &str) -> DoubleTarget {
        Parser::new(Lexer::new(src).tokenize().unwrap()).parse_target().unwrap()
    }

    fn parse_err(src: &str) -> DoubleError {
        Lexer::new(src)
            .tokenize()
            .and_then(|tokens| Parser::new(tokens).parse_target())
            .unwrap_err()
    }

    #[test]
    fn bare_original() {
        let t = parse("\\App\\Mailer");
        assert_eq!(t.name, None);
        assert_eq!(t.original, "App\\Mailer");
        assert!(t.methods.is_empty());
    }

    #[test]
    fn named_with_methods() {
        let t = parse("Tests\\MailerDouble:App\\Mailer[send, static:configure]");
        assert_eq!(t.name.as_deref(), Some("Tests\\MailerDouble"));
        assert_eq!(t.original, "App\\Mailer");
        assert_eq!(
            t.methods,
            vec![
                RawMethodSpec { name: "send".into(), is_static: false },
                RawMethodSpec { name: "configure".into(), is_static: true },
            ]
        );
    }

    #[test]
    fn empty_method_list() {
        assert!(parse("Foo[]").methods.is_empty());
    }

    #[test]
    fn trailing_comma_in_method_list() {
        assert_eq!(parse("Foo[a,]").methods.len(), 1);
    }

    #[test]
    fn error_unclosed_method_list() {
        assert!(matches!(parse_err("Foo[a"), DoubleError::InvalidArgument(_)));
    }

    #[test]
    fn error_static_without_colon() {
        assert!(matches!(parse_err("Foo[static bar]"), DoubleError::InvalidArgument(_)));
    }

    #[test]
    fn error_trailing_input() {
        let err = parse_err("Foo[a] Bar");
        assert!(matches!(err, DoubleError::InvalidArgument(m) if m.contains("`Bar`")));
    }

    #[test]
    fn error_missing_original() {
        assert!(matches!(parse_err("Foo:"), DoubleError::InvalidArgument(_)));
    }
}
