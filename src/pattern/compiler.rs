//! Recursive-descent compiler from pattern tokens to an op tree.

use crate::pattern::errors::PatternError;
use crate::pattern::lexer::{tokenize, Spanned, Token};

/// One node of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Op {
    /// Node kind equals the word.
    Kind(String),
    /// Node source text equals the literal.
    Text(String),
    Any,
    /// Zero or more remaining sequence children.
    Rest,
    /// No node at this position.
    Nil,
    Union(Vec<Op>),
    All(Vec<Op>),
    Not(Box<Op>),
    Capture { name: String, inner: Box<Op> },
    Seq { head: Box<Op>, children: Vec<Op> },
}

impl Op {
    /// True for `...` and `$name:...`, which consume a run of children.
    pub(crate) fn is_rest(&self) -> bool {
        match self {
            Op::Rest => true,
            Op::Capture { inner, .. } => matches!(**inner, Op::Rest),
            _ => false,
        }
    }
}

pub(crate) fn compile(source: &str) -> Result<Op, PatternError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(PatternError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
    };
    let op = parser.term(false)?;
    if let Some((_, offset)) = parser.peek() {
        return Err(PatternError::TrailingInput { offset: *offset });
    }
    Ok(op)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Parse one term. `in_sequence` is true only for direct sequence
    /// children, the one place a rest marker may appear.
    fn term(&mut self, in_sequence: bool) -> Result<Op, PatternError> {
        let Some((token, offset)) = self.next() else {
            return Err(PatternError::UnexpectedEnd { offset: self.end });
        };

        match token {
            Token::Wildcard => Ok(Op::Any),
            Token::Nil => Ok(Op::Nil),
            Token::Word(word) => Ok(Op::Kind(word)),
            Token::Str(text) => Ok(Op::Text(text)),
            Token::Ellipsis if in_sequence => Ok(Op::Rest),
            Token::Ellipsis => Err(PatternError::MisplacedRest { offset }),
            Token::Bang => {
                let inner = self.term(false)?;
                Ok(Op::Not(Box::new(inner)))
            }
            Token::Capture(name) => {
                let inner = if matches!(self.peek(), Some((Token::Colon, _))) {
                    self.pos += 1;
                    self.term(in_sequence)?
                } else {
                    Op::Any
                };
                Ok(Op::Capture {
                    name,
                    inner: Box::new(inner),
                })
            }
            Token::LBrace => {
                let members = self.group('{', Token::RBrace, offset)?;
                Ok(Op::Union(members))
            }
            Token::LBracket => {
                let members = self.group('[', Token::RBracket, offset)?;
                Ok(Op::All(members))
            }
            Token::LParen => self.sequence(offset),
            other => Err(PatternError::UnexpectedToken {
                found: other.to_string(),
                offset,
            }),
        }
    }

    fn group(&mut self, open: char, close: Token, offset: usize) -> Result<Vec<Op>, PatternError> {
        let mut members = Vec::new();
        loop {
            match self.peek() {
                None => return Err(PatternError::Unterminated { open, offset }),
                Some((token, _)) if *token == close => {
                    self.pos += 1;
                    break;
                }
                Some(_) => members.push(self.term(false)?),
            }
        }
        if members.is_empty() {
            return Err(PatternError::EmptyGroup { open, offset });
        }
        Ok(members)
    }

    fn sequence(&mut self, offset: usize) -> Result<Op, PatternError> {
        match self.peek() {
            None => return Err(PatternError::Unterminated { open: '(', offset }),
            Some((Token::RParen, _)) => return Err(PatternError::EmptyGroup { open: '(', offset }),
            Some(_) => {}
        }
        let head = self.term(false)?;

        let mut children = Vec::new();
        loop {
            match self.peek() {
                None => return Err(PatternError::Unterminated { open: '(', offset }),
                Some((Token::RParen, _)) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => children.push(self.term(true)?),
            }
        }

        Ok(Op::Seq {
            head: Box::new(head),
            children,
        })
    }
}
