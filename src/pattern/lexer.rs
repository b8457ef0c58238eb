use crate::pattern::errors::PatternError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Bang,
    Colon,
    Ellipsis,
    Wildcard,
    Nil,
    Capture(String),
    Word(String),
    Str(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::Bang => f.write_str("'!'"),
            Token::Colon => f.write_str("':'"),
            Token::Ellipsis => f.write_str("'...'"),
            Token::Wildcard => f.write_str("'_'"),
            Token::Nil => f.write_str("'nil?'"),
            Token::Capture(name) => write!(f, "capture '${name}'"),
            Token::Word(word) => write!(f, "'{word}'"),
            Token::Str(text) => write!(f, "string {text:?}"),
        }
    }
}

/// A token with the byte offset where it starts.
pub(crate) type Spanned = (Token, usize);

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, PatternError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                // comment to end of line
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' | ')' | '{' | '}' | '[' | ']' | '!' | ':' => {
                chars.next();
                let token = match ch {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '!' => Token::Bang,
                    _ => Token::Colon,
                };
                tokens.push((token, offset));
            }
            '.' => {
                if input[offset..].starts_with("...") {
                    chars.nth(2);
                    tokens.push((Token::Ellipsis, offset));
                } else {
                    return Err(PatternError::UnexpectedCharacter { ch, offset });
                }
            }
            '"' => {
                chars.next();
                let text = lex_string(&mut chars, offset)?;
                tokens.push((Token::Str(text), offset));
            }
            '$' => {
                chars.next();
                let name = take_word(&mut chars);
                let valid = name
                    .chars()
                    .next()
                    .is_some_and(|first| first.is_ascii_alphabetic() || first == '_');
                if !valid {
                    return Err(PatternError::InvalidCaptureName { offset });
                }
                tokens.push((Token::Capture(name), offset));
            }
            c if is_word_char(c) => {
                let word = take_word(&mut chars);
                let token = if word == "_" {
                    Token::Wildcard
                } else if word == "nil" && chars.peek().is_some_and(|&(_, c)| c == '?') {
                    chars.next();
                    Token::Nil
                } else {
                    Token::Word(word)
                };
                tokens.push((token, offset));
            }
            _ => return Err(PatternError::UnexpectedCharacter { ch, offset }),
        }
    }

    Ok(tokens)
}

fn take_word(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> String {
    let mut word = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !is_word_char(c) {
            break;
        }
        word.push(c);
        chars.next();
    }
    word
}

fn lex_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
) -> Result<String, PatternError> {
    let mut text = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '"' => return Ok(text),
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, other)) => text.push(other),
                None => break,
            },
            other => text.push(other),
        }
    }
    Err(PatternError::UnterminatedString { offset: start })
}
