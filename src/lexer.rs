use crate::{
    ast::{Token, TokenKind},
    error::{QueryError, Result},
};

const COMPARISON_OPERATORS: [&str; 6] = ["eq", "ne", "gt", "ge", "lt", "le"];

/// Tokenizer over one query option value.
///
/// The lexer always holds a current token; [`Lexer::next_token`] advances and
/// [`Lexer::peek_next_token`] looks one token ahead without consuming anything.
pub struct Lexer {
    input: Vec<char>,
    /// Scan position just past the current token
    position: usize,
    current: Token,
}

impl Lexer {
    /// Creates a lexer positioned on the first token of `input`.
    pub fn new(input: &str) -> Result<Self> {
        let mut lexer = Lexer {
            input: input.chars().collect(),
            position: 0,
            current: Token::new(TokenKind::End, "", 0),
        };
        lexer.next_token()?;
        Ok(lexer)
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Used by the parser to fold a leading `-` into a numeric literal.
    pub(crate) fn current_mut(&mut self) -> &mut Token {
        &mut self.current
    }

    pub fn next_token(&mut self) -> Result<&Token> {
        let (token, end) = self.scan(self.position)?;
        self.current = token;
        self.position = end;
        Ok(&self.current)
    }

    pub fn peek_next_token(&self) -> Result<Token> {
        self.scan(self.position).map(|(token, _)| token)
    }

    /// Fails with a syntax error unless the current token is of `kind`.
    pub fn validate_token(&self, kind: TokenKind) -> Result<()> {
        if self.current.kind == kind {
            Ok(())
        } else {
            Err(QueryError::syntax(
                format!(
                    "Expected {}, found {}",
                    kind.describe(),
                    self.describe_current()
                ),
                self.current.text.clone(),
                self.current.position,
            ))
        }
    }

    /// True when the current token is one of `eq ne gt ge lt le`.
    pub fn is_comparison_operator(&self) -> bool {
        self.current.kind == TokenKind::Identifier
            && COMPARISON_OPERATORS.contains(&self.current.text.as_str())
    }

    pub fn describe_current(&self) -> String {
        match self.current.kind {
            TokenKind::End => "end of input".to_string(),
            _ => format!("'{}'", self.current.text),
        }
    }

    fn char_at(&self, index: usize) -> Option<char> {
        self.input.get(index).copied()
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.input[start..end].iter().collect()
    }

    fn skip_whitespace(&self, mut index: usize) -> usize {
        while self.char_at(index).is_some_and(char::is_whitespace) {
            index += 1;
        }
        index
    }

    /// Scans the token starting at or after `start`; returns it with the index just past it.
    fn scan(&self, start: usize) -> Result<(Token, usize)> {
        let pos = self.skip_whitespace(start);

        let Some(ch) = self.char_at(pos) else {
            return Ok((Token::new(TokenKind::End, "", pos), pos));
        };

        let punctuation = match ch {
            '(' => Some(TokenKind::OpenParen),
            ')' => Some(TokenKind::CloseParen),
            ',' => Some(TokenKind::Comma),
            ':' => Some(TokenKind::Colon),
            '/' => Some(TokenKind::Slash),
            '*' => Some(TokenKind::Star),
            '-' => Some(TokenKind::Minus),
            '=' => Some(TokenKind::Equal),
            _ => None,
        };
        if let Some(kind) = punctuation {
            return Ok((Token::new(kind, ch, pos), pos + 1));
        }

        match ch {
            '\'' => {
                let end = self.scan_quoted(pos, pos)?;
                Ok((
                    Token::new(TokenKind::StringLiteral, self.text(pos, end), pos),
                    end,
                ))
            }
            c if c.is_ascii_digit() => self.scan_number(pos),
            c if is_identifier_start(c) => self.scan_identifier(pos),
            c => Err(QueryError::syntax(
                format!("Unexpected character '{}'", c),
                c,
                pos,
            )),
        }
    }

    /// Scans a `'...'` body starting at the opening quote; `''` is an escaped quote.
    fn scan_quoted(&self, token_start: usize, quote: usize) -> Result<usize> {
        let mut index = quote + 1;
        loop {
            match self.char_at(index) {
                None => {
                    return Err(QueryError::syntax(
                        "Unterminated quoted literal",
                        self.text(token_start, index),
                        token_start,
                    ));
                }
                Some('\'') if self.char_at(index + 1) == Some('\'') => index += 2,
                Some('\'') => return Ok(index + 1),
                Some(_) => index += 1,
            }
        }
    }

    fn scan_digits(&self, mut index: usize) -> usize {
        while self.char_at(index).is_some_and(|c| c.is_ascii_digit()) {
            index += 1;
        }
        index
    }

    fn scan_number(&self, start: usize) -> Result<(Token, usize)> {
        let mut index = self.scan_digits(start);
        let mut integral = true;

        if self.char_at(index) == Some('.')
            && self.char_at(index + 1).is_some_and(|c| c.is_ascii_digit())
        {
            integral = false;
            index = self.scan_digits(index + 1);
        }

        if matches!(self.char_at(index), Some('e' | 'E')) {
            let digits_at = match self.char_at(index + 1) {
                Some('+' | '-') => index + 2,
                _ => index + 1,
            };
            if self.char_at(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                integral = false;
                index = self.scan_digits(digits_at);
            }
        }

        let (kind, end) = match self.char_at(index) {
            Some('L' | 'l') if integral => (TokenKind::Int64Literal, index + 1),
            Some('M' | 'm') => (TokenKind::DecimalLiteral, index + 1),
            Some('F' | 'f') => (TokenKind::SingleLiteral, index + 1),
            Some('D' | 'd') => (TokenKind::DoubleLiteral, index + 1),
            _ if integral => (TokenKind::Int32Literal, index),
            _ => (TokenKind::DoubleLiteral, index),
        };

        if self.char_at(end).is_some_and(is_identifier_part) {
            let bad_end = self.scan_while(end, is_identifier_part);
            return Err(QueryError::syntax(
                "Invalid numeric literal",
                self.text(start, bad_end),
                start,
            ));
        }

        Ok((Token::new(kind, self.text(start, end), start), end))
    }

    fn scan_while(&self, mut index: usize, predicate: fn(char) -> bool) -> usize {
        while self.char_at(index).is_some_and(predicate) {
            index += 1;
        }
        index
    }

    fn scan_identifier(&self, start: usize) -> Result<(Token, usize)> {
        let end = self.scan_while(start + 1, is_identifier_part);
        let text = self.text(start, end);

        if self.char_at(end) == Some('\'') {
            let kind = typed_literal_kind(&text).ok_or_else(|| {
                QueryError::syntax(
                    format!("Unrecognized literal prefix '{}'", text),
                    text.clone(),
                    start,
                )
            })?;
            let literal_end = self.scan_quoted(start, end)?;
            return Ok((
                Token::new(kind, self.text(start, literal_end), start),
                literal_end,
            ));
        }

        let kind = match text.as_str() {
            "null" => TokenKind::NullLiteral,
            "true" | "false" => TokenKind::BooleanLiteral,
            "INF" | "NaN" | "INFd" | "INFD" | "NaNd" | "NaND" => TokenKind::DoubleLiteral,
            "INFf" | "INFF" | "NaNf" | "NaNF" => TokenKind::SingleLiteral,
            _ => TokenKind::Identifier,
        };
        Ok((Token::new(kind, text, start), end))
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Prefixes of quoted typed literals, matched case-insensitively.
fn typed_literal_kind(prefix: &str) -> Option<TokenKind> {
    match prefix.to_ascii_lowercase().as_str() {
        "datetime" => Some(TokenKind::DateTimeLiteral),
        "datetimeoffset" => Some(TokenKind::DateTimeOffsetLiteral),
        "time" => Some(TokenKind::TimeLiteral),
        "guid" => Some(TokenKind::GuidLiteral),
        "binary" | "x" => Some(TokenKind::BinaryLiteral),
        "geography" => Some(TokenKind::GeographyLiteral),
        "geometry" => Some(TokenKind::GeometryLiteral),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input).unwrap();
        let mut kinds = vec![lexer.current().kind];
        while lexer.current().kind != TokenKind::End {
            kinds.push(lexer.next_token().unwrap().kind);
        }
        kinds
    }

    #[test]
    fn test_keywords_are_identifiers() {
        let mut lexer = Lexer::new("Price eq 5").unwrap();
        assert!(lexer.current().identifier_is("Price"));
        lexer.next_token().unwrap();
        assert!(lexer.is_comparison_operator());
        assert!(lexer.current().identifier_is("eq"));
    }

    #[test]
    fn test_lambda_punctuation() {
        assert_eq!(
            kinds("any(d:d/Amount)"),
            vec![
                TokenKind::Identifier,
                TokenKind::OpenParen,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::Slash,
                TokenKind::Identifier,
                TokenKind::CloseParen,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_peek_does_not_consume() {
        let lexer = Lexer::new("a b").unwrap();
        assert_eq!(lexer.peek_next_token().unwrap().text, "b");
        assert_eq!(lexer.current().text, "a");
    }
}
