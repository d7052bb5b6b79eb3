//! Tokenizer for Prolog text.
//!
//! Produces atoms (plain, quoted and symbolic), functors (an atom glued
//! to an opening parenthesis), variables, numbers including `0'c`
//! character codes and radix notation, double-quoted strings, solo
//! punctuation and the end-of-term full stop. Line and block comments
//! are consumed here, so the parser never sees them.

use crate::term::is_graphic_char;
use num_bigint::BigInt;
use num_traits::Num;
use std::fmt;

/// A lexical error or, downstream, a grammar error. Carries the source
/// position where the trouble started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syntax error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A plain, quoted or symbolic atom.
    Atom(String),
    /// An atom immediately followed by `(`.
    Functor(String),
    /// A named variable.
    Var(String),
    /// The anonymous variable `_`.
    Void,
    Int(BigInt),
    Float(f64),
    /// A double-quoted string; becomes a code list.
    Str(String),
    /// Solo characters: `( ) [ ] { } , |`
    Punct(char),
    /// The end-of-term `.`
    FullStop,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        Lexer {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.line, self.column)
    }

    /// Produce the next token. Returns `Eof` forever once exhausted.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;
        let (line, column) = (self.line, self.column);
        let kind = self.scan()?;
        Ok(Token { kind, line, column })
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('%') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(ParseError::new(
                                    "unterminated block comment",
                                    line,
                                    column,
                                ))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan(&mut self) -> Result<TokenKind, ParseError> {
        let Some(c) = self.peek() else {
            return Ok(TokenKind::Eof);
        };

        match c {
            '(' | ')' | '[' | ']' | '{' | '}' | ',' | '|' => {
                self.bump();
                Ok(TokenKind::Punct(c))
            }
            '!' | ';' => {
                self.bump();
                Ok(self.atom_or_functor(c.to_string()))
            }
            '\'' => {
                let name = self.quoted('\'')?;
                Ok(self.atom_or_functor(name))
            }
            '"' => {
                let text = self.quoted('"')?;
                Ok(TokenKind::Str(text))
            }
            c if c.is_ascii_digit() => self.number(),
            c if c.is_uppercase() || c == '_' => {
                let name = self.identifier();
                if name == "_" {
                    Ok(TokenKind::Void)
                } else {
                    Ok(TokenKind::Var(name))
                }
            }
            c if c.is_lowercase() => {
                let name = self.identifier();
                Ok(self.atom_or_functor(name))
            }
            c if is_graphic_char(c) => {
                let mut run = String::new();
                while let Some(g) = self.peek() {
                    if is_graphic_char(g) {
                        run.push(g);
                        self.bump();
                    } else {
                        break;
                    }
                }
                if run == "." && self.at_term_end() {
                    return Ok(TokenKind::FullStop);
                }
                Ok(self.atom_or_functor(run))
            }
            other => Err(self.error(format!("unexpected character {:?}", other))),
        }
    }

    /// A lone `.` ends a term when followed by layout, a comment or EOF.
    fn at_term_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(c) => c.is_whitespace() || c == '%',
        }
    }

    fn atom_or_functor(&mut self, name: String) -> TokenKind {
        if self.peek() == Some('(') {
            self.bump();
            TokenKind::Functor(name)
        } else {
            TokenKind::Atom(name)
        }
    }

    fn identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        name
    }

    /// Scan the body of a quoted atom or string, `delim` already peeked.
    fn quoted(&mut self, delim: char) -> Result<String, ParseError> {
        let (line, column) = (self.line, self.column);
        self.bump(); // opening quote
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::new("unterminated quote", line, column)),
                Some(c) if c == delim => {
                    // doubled delimiter is a literal occurrence
                    if self.peek() == Some(delim) {
                        self.bump();
                        text.push(delim);
                    } else {
                        return Ok(text);
                    }
                }
                Some('\\') => match self.bump() {
                    None => return Err(ParseError::new("unterminated escape", line, column)),
                    Some('\n') => {} // line continuation
                    Some(e) => text.push(self.escape_char(e)?),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn escape_char(&mut self, e: char) -> Result<char, ParseError> {
        Ok(match e {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            's' => ' ',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            '`' => '`',
            'x' => {
                let mut digits = String::new();
                while let Some(d) = self.peek() {
                    if d.is_ascii_hexdigit() {
                        digits.push(d);
                        self.bump();
                    } else {
                        break;
                    }
                }
                if self.peek() == Some('\\') {
                    self.bump();
                }
                let code = u32::from_str_radix(&digits, 16)
                    .map_err(|_| self.error("bad hex escape"))?;
                char::from_u32(code).ok_or_else(|| self.error("bad character code"))?
            }
            d if d.is_digit(8) => {
                let mut digits = String::from(d);
                while let Some(o) = self.peek() {
                    if o.is_digit(8) {
                        digits.push(o);
                        self.bump();
                    } else {
                        break;
                    }
                }
                if self.peek() == Some('\\') {
                    self.bump();
                }
                let code = u32::from_str_radix(&digits, 8)
                    .map_err(|_| self.error("bad octal escape"))?;
                char::from_u32(code).ok_or_else(|| self.error("bad character code"))?
            }
            other => return Err(self.error(format!("unknown escape \\{}", other))),
        })
    }

    fn number(&mut self) -> Result<TokenKind, ParseError> {
        // radix and character-code notation all start with 0
        if self.peek() == Some('0') {
            match self.peek_at(1) {
                Some('\'') => {
                    self.bump();
                    self.bump();
                    let code = self.char_code()?;
                    return Ok(TokenKind::Int(BigInt::from(code)));
                }
                Some('x') => return self.radix_number(16),
                Some('o') => return self.radix_number(8),
                Some('b') => return self.radix_number(2),
                _ => {}
            }
        }

        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }

        // a fraction makes it a float; a bare `.` is the full stop
        let is_float = self.peek() == Some('.')
            && self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false);
        if !is_float {
            let value = digits
                .parse::<BigInt>()
                .map_err(|_| self.error("bad integer"))?;
            return Ok(TokenKind::Int(value));
        }

        digits.push('.');
        self.bump();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut exponent = String::new();
            let mut offset = 1;
            if matches!(self.peek_at(1), Some('+') | Some('-')) {
                exponent.push(self.peek_at(1).unwrap());
                offset = 2;
            }
            if self.peek_at(offset).map(|c| c.is_ascii_digit()).unwrap_or(false) {
                digits.push('e');
                self.bump();
                for _ in 1..offset {
                    self.bump();
                }
                digits.push_str(&exponent);
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        digits.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        let value = digits
            .parse::<f64>()
            .map_err(|_| self.error("bad float"))?;
        Ok(TokenKind::Float(value))
    }

    fn radix_number(&mut self, radix: u32) -> Result<TokenKind, ParseError> {
        self.bump(); // 0
        self.bump(); // x, o or b
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_digit(radix) {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            return Err(self.error("missing digits after radix prefix"));
        }
        let value = BigInt::from_str_radix(&digits, radix)
            .map_err(|_| self.error("bad radix integer"))?;
        Ok(TokenKind::Int(value))
    }

    /// The character after `0'`: an escape, a doubled quote, or itself.
    fn char_code(&mut self) -> Result<u32, ParseError> {
        match self.bump() {
            None => Err(self.error("missing character after 0'")),
            Some('\\') => {
                let e = self
                    .bump()
                    .ok_or_else(|| self.error("unterminated escape"))?;
                Ok(self.escape_char(e)? as u32)
            }
            Some('\'') if self.peek() == Some('\'') => {
                self.bump();
                Ok('\'' as u32)
            }
            Some(c) => Ok(c as u32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                return out;
            }
        }
    }

    fn atom(s: &str) -> TokenKind {
        TokenKind::Atom(s.into())
    }

    #[test]
    fn lexes_a_simple_fact() {
        assert_eq!(
            kinds("father(michael)."),
            vec![
                TokenKind::Functor("father".into()),
                atom("michael"),
                TokenKind::Punct(')'),
                TokenKind::FullStop,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn functor_requires_adjacent_paren() {
        assert_eq!(
            kinds("f (x)"),
            vec![
                atom("f"),
                TokenKind::Punct('('),
                atom("x"),
                TokenKind::Punct(')'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_variables_and_void() {
        assert_eq!(
            kinds("X _Tail _"),
            vec![
                TokenKind::Var("X".into()),
                TokenKind::Var("_Tail".into()),
                TokenKind::Void,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_graphic_atoms() {
        assert_eq!(
            kinds("a :- b"),
            vec![atom("a"), atom(":-"), atom("b"), TokenKind::Eof]
        );
        assert_eq!(kinds("=.."), vec![atom("=.."), TokenKind::Eof]);
    }

    #[test]
    fn full_stop_needs_following_layout() {
        assert_eq!(kinds("a."), vec![atom("a"), TokenKind::FullStop, TokenKind::Eof]);
        // a dot glued to more graphics is a symbolic atom
        assert_eq!(kinds(".."), vec![atom(".."), TokenKind::Eof]);
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(
            kinds("42 3.25 1.0e3"),
            vec![
                TokenKind::Int(BigInt::from(42)),
                TokenKind::Float(3.25),
                TokenKind::Float(1000.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn integer_then_full_stop_is_not_a_float() {
        assert_eq!(
            kinds("42."),
            vec![TokenKind::Int(BigInt::from(42)), TokenKind::FullStop, TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_radix_and_char_codes() {
        assert_eq!(kinds("0xff"), vec![TokenKind::Int(BigInt::from(255)), TokenKind::Eof]);
        assert_eq!(kinds("0b101"), vec![TokenKind::Int(BigInt::from(5)), TokenKind::Eof]);
        assert_eq!(kinds("0o17"), vec![TokenKind::Int(BigInt::from(15)), TokenKind::Eof]);
        assert_eq!(kinds("0'a"), vec![TokenKind::Int(BigInt::from(97)), TokenKind::Eof]);
        assert_eq!(kinds("0'\\n"), vec![TokenKind::Int(BigInt::from(10)), TokenKind::Eof]);
    }

    #[test]
    fn lexes_quoted_atoms() {
        assert_eq!(kinds("'hello world'"), vec![atom("hello world"), TokenKind::Eof]);
        assert_eq!(kinds(r"'don\'t'"), vec![atom("don't"), TokenKind::Eof]);
        assert_eq!(kinds("'it''s'"), vec![atom("it's"), TokenKind::Eof]);
    }

    #[test]
    fn lexes_strings() {
        assert_eq!(
            kinds(r#""abc""#),
            vec![TokenKind::Str("abc".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            kinds("a % trailing\nb /* block\ncomment */ c"),
            vec![atom("a"), atom("b"), atom("c"), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let mut lexer = Lexer::new("/* oops");
        let err = lexer.next_token().unwrap_err();
        assert!(err.message.contains("unterminated"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn positions_track_lines() {
        let mut lexer = Lexer::new("a\n  b");
        let a = lexer.next_token().unwrap();
        let b = lexer.next_token().unwrap();
        assert_eq!((a.line, a.column), (1, 1));
        assert_eq!((b.line, b.column), (2, 3));
    }

    #[test]
    fn cut_and_semicolon_are_solo_atoms() {
        assert_eq!(
            kinds("! ; !"),
            vec![atom("!"), atom(";"), atom("!"), TokenKind::Eof]
        );
    }
}
