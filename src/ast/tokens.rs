/// Classification of a lexical token.
///
/// Keywords (`and`, `eq`, `asc`, ...) are not separate kinds: they are
/// [`TokenKind::Identifier`] tokens compared by text, so they stay usable as
/// property names wherever the grammar does not expect an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// End of input
    End,

    /// Property, function or keyword name
    ///
    /// # Examples
    /// ```text
    /// Name
    /// geo.distance
    /// $it
    /// ```
    Identifier,

    // Literals
    /// `null`
    NullLiteral,
    /// `true` / `false`
    BooleanLiteral,
    /// Integer without suffix, e.g. `42`
    Int32Literal,
    /// Integer with `L` suffix, e.g. `42L`
    Int64Literal,
    /// `1.5f`, `INFf`
    SingleLiteral,
    /// `1.5`, `1e10`, `2d`, `NaN`
    DoubleLiteral,
    /// `1.5m`
    DecimalLiteral,
    /// `'O''Neil'`
    StringLiteral,
    /// `datetime'2012-05-01T10:00'`
    DateTimeLiteral,
    /// `datetimeoffset'2012-05-01T10:00:00Z'`
    DateTimeOffsetLiteral,
    /// `time'PT1H30M'`
    TimeLiteral,
    /// `guid'c9a1f5e6-...'`
    GuidLiteral,
    /// `binary'0AFF'` or `X'0AFF'`
    BinaryLiteral,
    /// `geography'SRID=4326;POINT(1 2)'`
    GeographyLiteral,
    /// `geometry'POINT(1 2)'`
    GeometryLiteral,

    // Punctuation
    OpenParen,
    CloseParen,
    Comma,
    /// Lambda parameter separator inside `any(...)` / `all(...)`
    Colon,
    /// Member access / path separator
    Slash,
    Star,
    /// Unary negation; binary subtraction is the `sub` keyword
    Minus,
    /// Name/value separator in key predicates
    Equal,
}

impl TokenKind {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::NullLiteral
                | TokenKind::BooleanLiteral
                | TokenKind::Int32Literal
                | TokenKind::Int64Literal
                | TokenKind::SingleLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::DecimalLiteral
                | TokenKind::StringLiteral
                | TokenKind::DateTimeLiteral
                | TokenKind::DateTimeOffsetLiteral
                | TokenKind::TimeLiteral
                | TokenKind::GuidLiteral
                | TokenKind::BinaryLiteral
                | TokenKind::GeographyLiteral
                | TokenKind::GeometryLiteral
        )
    }

    /// Literal kinds a leading `-` folds into.
    pub fn is_numeric_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Int32Literal
                | TokenKind::Int64Literal
                | TokenKind::SingleLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::DecimalLiteral
        )
    }

    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::End => "end of input",
            TokenKind::Identifier => "identifier",
            TokenKind::OpenParen => "'('",
            TokenKind::CloseParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Slash => "'/'",
            TokenKind::Star => "'*'",
            TokenKind::Minus => "'-'",
            TokenKind::Equal => "'='",
            _ => "literal",
        }
    }
}

/// A single lexical unit with its source text and zero-based character position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    /// True for an identifier token spelled exactly `keyword`.
    pub fn identifier_is(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == keyword
    }
}
