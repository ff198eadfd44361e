use crate::error::DoubleError;
use crate::syntax::token::{Token, TokenKind, keyword_or_ident};

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source: source.as_bytes(), pos: 0, column: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, DoubleError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.column));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, DoubleError> {
        let col = self.column;
        let ch = self.advance();

        let kind = match ch {
            b'\\' => TokenKind::Backslash,
            b':'  => TokenKind::Colon,
            b','  => TokenKind::Comma,
            b'['  => TokenKind::LBracket,
            b']'  => TokenKind::RBracket,
            c if is_ident_byte(c) => keyword_or_ident(self.read_ident()),

            other => {
                return Err(DoubleError::InvalidArgument(format!(
                    "unexpected character `{}` at column {col} of double target",
                    other as char
                )));
            }
        };

        Ok(Token::new(kind, col))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        // continuation bytes of a multi-byte char don't start a new column
        if ch & 0xC0 != 0x80 { self.column += 1; }
        ch
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.source[self.pos] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_ascii_whitespace() {
            self.advance();
        }
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    /// Reads the rest of an identifier whose first byte was just consumed.
    fn read_ident(&mut self) -> String {
        let start = self.pos - 1;
        while !self.is_at_end() && is_ident_byte(self.peek()) {
            self.advance();
        }
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }
}

/// ASCII letters, digits, `_` and any non-ASCII byte.
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn qualified_name() {
        assert_eq!(
            lex("\\App\\Foo"),
            vec![
                TokenKind::Backslash,
                TokenKind::Ident("App".into()),
                TokenKind::Backslash,
                TokenKind::Ident("Foo".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn static_is_a_keyword() {
        assert_eq!(
            lex("static:bar"),
            vec![TokenKind::Static, TokenKind::Colon, TokenKind::Ident("bar".into()), TokenKind::Eof]
        );
        assert_eq!(lex("statics"), vec![TokenKind::Ident("statics".into()), TokenKind::Eof]);
    }

    #[test]
    fn whitespace_in_method_list() {
        assert_eq!(
            lex("[ foo ,bar ]"),
            vec![
                TokenKind::LBracket,
                TokenKind::Ident("foo".into()),
                TokenKind::Comma,
                TokenKind::Ident("bar".into()),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn non_ascii_identifier() {
        assert_eq!(lex("Çafé"), vec![TokenKind::Ident("Çafé".into()), TokenKind::Eof]);
    }

    #[test]
    fn columns_count_characters() {
        let tokens = Lexer::new("é:x").tokenize().unwrap();
        assert_eq!(tokens[1].column, 2);
        assert_eq!(tokens[2].column, 3);
    }

    #[test]
    fn unexpected_character() {
        let err = Lexer::new("Foo(").tokenize().unwrap_err();
        assert!(matches!(err, DoubleError::InvalidArgument(m) if m.contains("column 4")));
    }
}
