#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// One segment of a type name, or a method name.
    Ident(String),

    // Keywords
    Static,

    // Punctuation
    Backslash,  // \
    Colon,      // :
    Comma,      // ,
    LBracket,   // [
    RBracket,   // ]

    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(s)  => format!("`{s}`"),
            Self::Static    => "`static`".into(),
            Self::Backslash => "`\\`".into(),
            Self::Colon     => "`:`".into(),
            Self::Comma     => "`,`".into(),
            Self::LBracket  => "`[`".into(),
            Self::RBracket  => "`]`".into(),
            Self::Eof       => "end of input".into(),
        }
    }
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "static" => TokenKind::Static,
        _        => TokenKind::Ident(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Token {
    pub kind:   TokenKind,
    /// 1-based character column in the target string.
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, column: usize) -> Self {
        Self { kind, column }
    }
}
