//! One-pass streaming lexer.
//!
//! [`Scanner`] walks a `&str` source byte by byte and yields
//! `Result<Token<'a>>` items. Whitespace and `//` comments are skipped, an
//! unexpected byte or an unterminated string yields an `Err` item and
//! scanning resumes after it, and exactly one `EOF` token closes the stream.
//! Every lexeme is a slice of the source text, so tokens never allocate.

use crate::error::{LoxError, Result};
use crate::token::{Literal, Token, TokenKind};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "and"    => TokenKind::And,
    "class"  => TokenKind::Class,
    "else"   => TokenKind::Else,
    "false"  => TokenKind::False,
    "fun"    => TokenKind::Fun,
    "for"    => TokenKind::For,
    "if"     => TokenKind::If,
    "nil"    => TokenKind::Nil,
    "or"     => TokenKind::Or,
    "print"  => TokenKind::Print,
    "return" => TokenKind::Return,
    "super"  => TokenKind::Super,
    "this"   => TokenKind::This,
    "true"   => TokenKind::True,
    "var"    => TokenKind::Var,
    "while"  => TokenKind::While,
};

pub struct Scanner<'a> {
    source: &'a str,
    start: usize, // first byte of the current lexeme
    curr: usize,  // one past the last byte examined
    line: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            start: 0,
            curr: 0,
            line: 1,
            done: false,
        }
    }

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.source.as_bytes()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.source.len()
    }

    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Current byte, or `0` past the end.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.bytes().get(self.curr).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        self.bytes().get(self.curr + 1).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.peek() == expected && !self.is_at_end() {
            self.curr += 1;
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.curr]
    }

    fn token(&self, kind: TokenKind) -> Token<'a> {
        Token::new(kind, self.lexeme(), self.line)
    }

    fn either(&mut self, second: u8, matched: TokenKind, single: TokenKind) -> TokenKind {
        if self.match_byte(second) {
            matched
        } else {
            single
        }
    }

    /// Scans from `self.curr` until a token is recognised. Returns `Ok(None)`
    /// when the input ends inside whitespace or a comment.
    fn scan_token(&mut self) -> Result<Option<Token<'a>>> {
        while !self.is_at_end() {
            self.start = self.curr;

            let kind = match self.advance() {
                b'(' => TokenKind::LeftParen,
                b')' => TokenKind::RightParen,
                b'{' => TokenKind::LeftBrace,
                b'}' => TokenKind::RightBrace,
                b',' => TokenKind::Comma,
                b'.' => TokenKind::Dot,
                b'-' => TokenKind::Minus,
                b'+' => TokenKind::Plus,
                b';' => TokenKind::Semicolon,
                b'*' => TokenKind::Star,
                b'!' => self.either(b'=', TokenKind::BangEqual, TokenKind::Bang),
                b'=' => self.either(b'=', TokenKind::EqualEqual, TokenKind::Equal),
                b'<' => self.either(b'=', TokenKind::LessEqual, TokenKind::Less),
                b'>' => self.either(b'=', TokenKind::GreaterEqual, TokenKind::Greater),

                b'/' if self.match_byte(b'/') => {
                    // Leave the newline itself for the line counter.
                    match memchr(b'\n', &self.bytes()[self.curr..]) {
                        Some(offset) => self.curr += offset,
                        None => self.curr = self.source.len(),
                    }
                    continue;
                }
                b'/' => TokenKind::Slash,

                b' ' | b'\r' | b'\t' => continue,
                b'\n' => {
                    self.line += 1;
                    continue;
                }

                b'"' => return self.string().map(Some),
                b'0'..=b'9' => return Ok(Some(self.number())),
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => return Ok(Some(self.identifier())),

                _ => {
                    // Skip the rest of a multi-byte character so the next
                    // lexeme starts on a char boundary.
                    while !self.is_at_end() && !self.source.is_char_boundary(self.curr) {
                        self.curr += 1;
                    }

                    return Err(LoxError::lex(
                        self.line,
                        format!("Unexpected character: {}", self.lexeme()),
                    ));
                }
            };

            return Ok(Some(self.token(kind)));
        }

        Ok(None)
    }

    /// Double-quoted string; may span lines.
    fn string(&mut self) -> Result<Token<'a>> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.curr += 1; // closing quote

        let contents = &self.source[self.start + 1..self.curr - 1];

        Ok(Token::with_literal(
            TokenKind::String,
            self.lexeme(),
            Literal::Str(contents),
            self.line,
        ))
    }

    fn number(&mut self) -> Token<'a> {
        while self.peek().is_ascii_digit() {
            self.curr += 1;
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.curr += 1;

            while self.peek().is_ascii_digit() {
                self.curr += 1;
            }
        }

        // Only ASCII digits and at most one dot were consumed.
        let value = self.lexeme().parse::<f64>().unwrap_or_default();

        Token::with_literal(
            TokenKind::Number,
            self.lexeme(),
            Literal::Number(value),
            self.line,
        )
    }

    fn identifier(&mut self) -> Token<'a> {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.curr += 1;
        }

        let kind = KEYWORDS
            .get(self.lexeme())
            .copied()
            .unwrap_or(TokenKind::Identifier);

        self.token(kind)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.scan_token() {
            Ok(Some(token)) => {
                debug!("Scanned {:?} '{}' on line {}", token.kind, token.lexeme, token.line);
                Some(Ok(token))
            }
            Ok(None) => {
                self.done = true;
                Some(Ok(Token::new(TokenKind::Eof, "", self.line)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl FusedIterator for Scanner<'_> {}

/// Scans the whole source, stopping at the first lexical error.
pub fn scan_tokens(source: &str) -> Result<Vec<Token<'_>>> {
    Scanner::new(source).collect()
}
