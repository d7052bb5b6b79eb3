//! Reader for Prolog terms.
//!
//! An operator-precedence parser over the lexer, using the default ISO
//! operator table. Supports:
//! - prefix, infix and the full-stop term terminator
//! - list sugar `[a, b | T]` and curly terms `{Goal}`
//! - double-quoted strings as code lists
//! - variables scoped per term: the same name is the same variable
//!   within one term, `_` is always fresh
//!
//! Every parsed term carries fresh variable ids, so two reads of the
//! same text never share variables.

use crate::lex::{Lexer, Token, TokenKind};
use crate::term::{Term, Var};
use hashbrown::HashMap;

pub use crate::lex::ParseError;

/// Operator fixity. The default table has no postfix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fixity {
    Fx,
    Fy,
    Xfx,
    Xfy,
    Yfx,
}

struct OpTable {
    prefix: HashMap<&'static str, (u16, Fixity)>,
    infix: HashMap<&'static str, (u16, Fixity)>,
}

/// The ISO default operator table, §6.3.4.4 table 7.
fn default_ops() -> OpTable {
    let mut prefix = HashMap::new();
    let mut infix = HashMap::new();

    for name in [":-", "?-"] {
        prefix.insert(name, (1200, Fixity::Fx));
    }
    prefix.insert("\\+", (900, Fixity::Fy));
    for name in ["-", "\\"] {
        prefix.insert(name, (200, Fixity::Fy));
    }

    for name in [":-", "-->"] {
        infix.insert(name, (1200, Fixity::Xfx));
    }
    infix.insert(";", (1100, Fixity::Xfy));
    infix.insert("->", (1050, Fixity::Xfy));
    infix.insert(",", (1000, Fixity::Xfy));
    for name in [
        "=", "\\=", "==", "\\==", "@<", "@=<", "@>", "@>=", "=..", "is", "=:=", "=\\=", "<",
        "=<", ">", ">=",
    ] {
        infix.insert(name, (700, Fixity::Xfx));
    }
    for name in ["+", "-", "/\\", "\\/"] {
        infix.insert(name, (500, Fixity::Yfx));
    }
    for name in ["*", "/", "//", "rem", "mod", "<<", ">>"] {
        infix.insert(name, (400, Fixity::Yfx));
    }
    infix.insert("**", (200, Fixity::Xfx));
    infix.insert("^", (200, Fixity::Xfy));

    OpTable { prefix, infix }
}

/// Reads a sequence of terms from source text.
pub struct TermReader {
    lexer: Lexer,
    peeked: Option<Token>,
    ops: OpTable,
    /// Variables of the term currently being read, by display name.
    vars: HashMap<String, Var>,
}

impl TermReader {
    pub fn new(src: &str) -> Self {
        TermReader {
            lexer: Lexer::new(src),
            peeked: None,
            ops: default_ops(),
            vars: HashMap::new(),
        }
    }

    /// Read the next term, or None at end of input.
    pub fn next_term(&mut self) -> Result<Option<Term>, ParseError> {
        self.vars.clear();
        if self.peek()?.kind == TokenKind::Eof {
            return Ok(None);
        }
        let term = self.term(1200)?;
        let end = self.bump()?;
        if end.kind != TokenKind::FullStop {
            return Err(ParseError::new(
                format!("operator expected before {:?}", end.kind),
                end.line,
                end.column,
            ));
        }
        Ok(Some(term))
    }

    /// Read every remaining term.
    pub fn all(&mut self) -> Result<Vec<Term>, ParseError> {
        let mut terms = Vec::new();
        while let Some(term) = self.next_term()? {
            terms.push(term);
        }
        Ok(terms)
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token()?);
        }
        Ok(self.peeked.as_ref().expect("just filled"))
    }

    fn bump(&mut self) -> Result<Token, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<(), ParseError> {
        let token = self.bump()?;
        if token.kind == TokenKind::Punct(c) {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("expected {:?}, found {:?}", c, token.kind),
                token.line,
                token.column,
            ))
        }
    }

    fn term(&mut self, max_priority: u16) -> Result<Term, ParseError> {
        let (term, _) = self.term_prec(max_priority)?;
        Ok(term)
    }

    fn term_prec(&mut self, max_priority: u16) -> Result<(Term, u16), ParseError> {
        let (left, left_priority) = self.primary(max_priority)?;
        self.rest_term(left, left_priority, max_priority)
    }

    /// Climb infix operators to the left of the already-parsed term.
    fn rest_term(
        &mut self,
        mut left: Term,
        mut left_priority: u16,
        max_priority: u16,
    ) -> Result<(Term, u16), ParseError> {
        loop {
            let name = match &self.peek()?.kind {
                TokenKind::Atom(name) => name.clone(),
                TokenKind::Punct(',') => ",".to_string(),
                _ => break,
            };
            let Some(&(priority, fixity)) = self.ops.infix.get(name.as_str()) else {
                break;
            };
            let (left_arg_max, right_arg_max) = match fixity {
                Fixity::Xfx => (priority - 1, priority - 1),
                Fixity::Xfy => (priority - 1, priority),
                Fixity::Yfx => (priority, priority - 1),
                _ => unreachable!("prefix fixity in the infix table"),
            };
            if priority > max_priority || left_priority > left_arg_max {
                break;
            }
            self.bump()?;
            let right = self.term(right_arg_max)?;
            left = Term::compound(&name, [left, right]);
            left_priority = priority;
        }
        Ok((left, left_priority))
    }

    fn primary(&mut self, max_priority: u16) -> Result<(Term, u16), ParseError> {
        let token = self.bump()?;
        match token.kind {
            TokenKind::Punct('(') => {
                let inner = self.term(1200)?;
                self.expect_punct(')')?;
                Ok((inner, 0))
            }
            TokenKind::Punct('[') => Ok((self.list_tail()?, 0)),
            TokenKind::Punct('{') => {
                if self.peek()?.kind == TokenKind::Punct('}') {
                    self.bump()?;
                    return Ok((Term::atom("{}"), 0));
                }
                let inner = self.term(1200)?;
                self.expect_punct('}')?;
                Ok((Term::compound("{}", [inner]), 0))
            }
            TokenKind::Int(value) => Ok((Term::Int(value), 0)),
            TokenKind::Float(value) => Ok((Term::Float(value), 0)),
            TokenKind::Str(text) => Ok((Term::code_list(&text), 0)),
            TokenKind::Var(name) => Ok((Term::Var(self.variable(&name)), 0)),
            TokenKind::Void => Ok((Term::Var(Var::anonymous()), 0)),
            TokenKind::Functor(name) => {
                let mut args = Vec::new();
                loop {
                    args.push(self.term(999)?);
                    let next = self.bump()?;
                    match next.kind {
                        TokenKind::Punct(')') => break,
                        TokenKind::Punct(',') => continue,
                        other => {
                            return Err(ParseError::new(
                                format!("expected , or ) in arguments, found {:?}", other),
                                next.line,
                                next.column,
                            ))
                        }
                    }
                }
                Ok((Term::compound(&name, args), 0))
            }
            TokenKind::Atom(name) => {
                if let Some(&(priority, fixity)) = self.ops.prefix.get(name.as_str()) {
                    if priority <= max_priority && self.starts_term()? {
                        // a minus sign glued to a number literal negates it
                        if name == "-" {
                            match &self.peek()?.kind {
                                TokenKind::Int(_) => {
                                    let TokenKind::Int(v) = self.bump()?.kind else {
                                        unreachable!()
                                    };
                                    return Ok((Term::Int(-v), 0));
                                }
                                TokenKind::Float(_) => {
                                    let TokenKind::Float(v) = self.bump()?.kind else {
                                        unreachable!()
                                    };
                                    return Ok((Term::Float(-v), 0));
                                }
                                _ => {}
                            }
                        }
                        let arg_max = match fixity {
                            Fixity::Fy => priority,
                            Fixity::Fx => priority - 1,
                            _ => unreachable!("infix fixity in the prefix table"),
                        };
                        let arg = self.term(arg_max)?;
                        return Ok((Term::compound(&name, [arg]), priority));
                    }
                }
                Ok((Term::atom(&name), 0))
            }
            TokenKind::FullStop => Err(ParseError::new(
                "unexpected end of term",
                token.line,
                token.column,
            )),
            TokenKind::Eof => Err(ParseError::new(
                "unexpected end of input",
                token.line,
                token.column,
            )),
            TokenKind::Punct(c) => Err(ParseError::new(
                format!("unexpected {:?}", c),
                token.line,
                token.column,
            )),
        }
    }

    /// Whether the upcoming token can begin a term, deciding between a
    /// prefix operator and the same atom as an operand.
    fn starts_term(&mut self) -> Result<bool, ParseError> {
        Ok(matches!(
            self.peek()?.kind,
            TokenKind::Atom(_)
                | TokenKind::Functor(_)
                | TokenKind::Var(_)
                | TokenKind::Void
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Str(_)
                | TokenKind::Punct('(')
                | TokenKind::Punct('[')
                | TokenKind::Punct('{')
        ))
    }

    /// List items after `[`, including the `|Tail` and `]` endings.
    fn list_tail(&mut self) -> Result<Term, ParseError> {
        if self.peek()?.kind == TokenKind::Punct(']') {
            self.bump()?;
            return Ok(Term::nil());
        }
        let mut items = vec![self.term(999)?];
        loop {
            let next = self.bump()?;
            match next.kind {
                TokenKind::Punct(',') => items.push(self.term(999)?),
                TokenKind::Punct('|') => {
                    let tail = self.term(999)?;
                    self.expect_punct(']')?;
                    return Ok(Term::partial_list(items, tail));
                }
                TokenKind::Punct(']') => return Ok(Term::list(items)),
                other => {
                    return Err(ParseError::new(
                        format!("expected , | or ] in list, found {:?}", other),
                        next.line,
                        next.column,
                    ))
                }
            }
        }
    }

    fn variable(&mut self, name: &str) -> Var {
        *self
            .vars
            .entry(name.to_string())
            .or_insert_with(|| Var::named(name))
    }
}

/// Parse exactly one term from the text.
pub fn term(src: &str) -> Result<Term, ParseError> {
    let mut reader = TermReader::new(src);
    reader
        .next_term()?
        .ok_or_else(|| ParseError::new("no term found", 1, 1))
}

/// Parse every term in the text.
pub fn term_all(src: &str) -> Result<Vec<Term>, ParseError> {
    TermReader::new(src).all()
}

#[cfg(test)]
#[path = "tests/parser.rs"]
mod tests;
