use logos::Logos;
use std::fmt;
use thiserror::Error;

use crate::Span;

/// The category of a [`Token`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Number,
    LParen,
    RParen,
    Equal,
    Or,
    And,
    Xor,
    Not,
    Shl,
    Shr,
    Illegal,
    EndOfInput,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "IDENT",
            TokenKind::Number => "NUMBER",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::Equal => "EQUAL",
            TokenKind::Or => "OR",
            TokenKind::And => "AND",
            TokenKind::Xor => "XOR",
            TokenKind::Not => "NOT",
            TokenKind::Shl => "SHL",
            TokenKind::Shr => "SHR",
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::EndOfInput => "EOF",
        };
        f.write_str(name)
    }
}

/// A lexeme together with its category and location.
///
/// For [`TokenKind::Illegal`] the `text` holds the diagnostic instead of the
/// source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            text: text.into(),
            span,
        }
    }

    /// Byte offset of the first character of the lexeme.
    pub fn position(&self) -> usize {
        self.span.start
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::EndOfInput
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::EndOfInput => write!(f, "EOF"),
            _ => write!(f, "{}({:?})", self.kind, self.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexerErrorKind {
    #[error("malformed binary number")]
    MalformedBinaryNumber,
    #[error("malformed hex number")]
    MalformedHexNumber,
    #[error("malformed number")]
    MalformedNumber,
    // `<` or `>` followed by something other than its pair
    #[error("unexpected {0:?}")]
    IncompleteOperator(char),
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("unexpected {0:?} at {1}")]
    UnexpectedCharacter(char, usize),
}

/// A lexical error as seen by the parser: the diagnostic of an `Illegal`
/// token and where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LexerError {
    pub message: String,
    pub span: Span,
}

impl From<Token> for LexerError {
    fn from(token: Token) -> Self {
        LexerError {
            message: token.text,
            span: token.span,
        }
    }
}

// Raw lexemes recognised by the generated DFA. Numbers are matched greedily
// together with any alphanumeric tail and classified afterwards.
#[derive(Logos, Debug, Copy, Clone, PartialEq)]
#[logos(skip r"\s+")]
enum Lexeme {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("=")]
    Equal,
    #[token("|")]
    Or,
    #[token("&")]
    And,
    #[token("^")]
    Xor,
    #[token("~")]
    Not,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[regex(r"[\p{L}_][\p{L}\p{Nd}_]*")]
    Identifier,
    #[regex(r"[0-9][\p{L}\p{Nd}]*")]
    Number,
}

impl From<Lexeme> for TokenKind {
    fn from(lexeme: Lexeme) -> Self {
        match lexeme {
            Lexeme::LParen => TokenKind::LParen,
            Lexeme::RParen => TokenKind::RParen,
            Lexeme::Equal => TokenKind::Equal,
            Lexeme::Or => TokenKind::Or,
            Lexeme::And => TokenKind::And,
            Lexeme::Xor => TokenKind::Xor,
            Lexeme::Not => TokenKind::Not,
            Lexeme::Shl => TokenKind::Shl,
            Lexeme::Shr => TokenKind::Shr,
            Lexeme::Identifier => TokenKind::Identifier,
            Lexeme::Number => TokenKind::Number,
        }
    }
}

/// Checks a greedily matched number lexeme.
fn check_number(text: &str) -> Result<(), LexerErrorKind> {
    if let Some(digits) = text.strip_prefix("0b") {
        check_digits(
            digits,
            |c| matches!(c, '0' | '1'),
            LexerErrorKind::MalformedBinaryNumber,
        )
    } else if let Some(digits) = text.strip_prefix("0x") {
        check_digits(
            digits,
            |c| matches!(c, '0'..='9' | 'a'..='f'),
            LexerErrorKind::MalformedHexNumber,
        )
    } else if text.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(LexerErrorKind::MalformedNumber)
    }
}

// At least one digit must follow the prefix; anything else after the digits
// is a malformed suffix.
fn check_digits(
    digits: &str,
    is_digit: impl Fn(char) -> bool,
    missing: LexerErrorKind,
) -> Result<(), LexerErrorKind> {
    match digits.chars().next() {
        Some(first) if is_digit(first) => {}
        _ => return Err(missing),
    }
    if digits.chars().all(is_digit) {
        Ok(())
    } else {
        Err(LexerErrorKind::MalformedNumber)
    }
}

/// Lazy token stream over a source string.
///
/// Yields exactly one `EndOfInput` token at the end, or stops right after the
/// first `Illegal` token.
pub struct Tokenizer<'source> {
    source: &'source str,
    lexer: logos::Lexer<'source, Lexeme>,
    finished: bool,
}

impl<'source> Tokenizer<'source> {
    pub fn new(source: &'source str) -> Self {
        Tokenizer {
            source,
            lexer: Lexeme::lexer(source),
            finished: false,
        }
    }

    fn classify(&self, lexeme: Lexeme) -> Token {
        let span: Span = self.lexer.span().into();
        let text = self.lexer.slice();
        if lexeme == Lexeme::Number
            && let Err(error) = check_number(text)
        {
            return Token::new(TokenKind::Illegal, error.to_string(), span);
        }
        Token::new(lexeme.into(), text, span)
    }

    fn unexpected(&self) -> Token {
        let start = self.lexer.span().start;
        let mut chars = self.source.get(start..).unwrap_or("").chars();
        let (error, width) = match chars.next() {
            Some(op @ ('<' | '>')) => match chars.next() {
                Some(next) => (
                    LexerErrorKind::IncompleteOperator(next),
                    op.len_utf8() + next.len_utf8(),
                ),
                None => (LexerErrorKind::UnexpectedEndOfInput, op.len_utf8()),
            },
            Some(c) => (LexerErrorKind::UnexpectedCharacter(c, start), c.len_utf8()),
            None => (LexerErrorKind::UnexpectedEndOfInput, 0),
        };
        Token::new(
            TokenKind::Illegal,
            error.to_string(),
            Span::new(start, start + width),
        )
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = match self.lexer.next() {
            Some(Ok(lexeme)) => self.classify(lexeme),
            Some(Err(())) => self.unexpected(),
            None => Token::new(TokenKind::EndOfInput, "", Span::at(self.source.len())),
        };
        if matches!(token.kind, TokenKind::Illegal | TokenKind::EndOfInput) {
            self.finished = true;
        }
        Some(token)
    }
}

impl std::iter::FusedIterator for Tokenizer<'_> {}

/// Starts tokenizing `source`; tokens are produced on demand.
pub fn tokenize(source: &str) -> Tokenizer<'_> {
    Tokenizer::new(source)
}

// Helper to tokenize a whole string at once (tests, completion, benches)
pub fn tokenize_all(source: &str) -> Vec<Token> {
    tokenize(source).collect()
}
