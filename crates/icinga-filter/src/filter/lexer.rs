//! Lexer (tokenizer) for filter query strings.

use std::iter::Peekable;
use std::str::CharIndices;

use super::node::Operator;

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    /// The token.
    pub token: QueryToken,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// A token in a filter query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    /// A run of ordinary characters, still URL-encoded and trimmed.
    Text(String),

    /// A comparison operator (`=`, `!=`, `>`, `>=`, `<`, `<=`).
    Operator(Operator),

    /// The AND conjunction (`&`).
    And,

    /// The OR conjunction (`|`).
    Or,

    /// A negation (`!` not followed by `=`).
    Not,

    /// Opening parenthesis `(`.
    OpenParen,

    /// Closing parenthesis `)`.
    CloseParen,
}

impl QueryToken {
    /// Returns the source text of the token, used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            QueryToken::Text(text) => text.clone(),
            QueryToken::Operator(op) => op.token().to_string(),
            QueryToken::And => "&".to_string(),
            QueryToken::Or => "|".to_string(),
            QueryToken::Not => "!".to_string(),
            QueryToken::OpenParen => "(".to_string(),
            QueryToken::CloseParen => ")".to_string(),
        }
    }
}

/// Returns true for characters that end a text run.
fn is_special(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>' | '&' | '|' | '(' | ')')
}

/// Lexer for tokenizing filter query strings.
///
/// Every character belongs to some token, so tokenizing cannot fail; bad
/// structure is the parser's concern.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Consumes the next character if it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek().map(|&(_, c)| c) == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    /// Reads a text run starting at `start`.
    fn read_text(&mut self, start: usize) -> &'a str {
        let mut end = self.input.len();
        while let Some(&(idx, c)) = self.chars.peek() {
            if is_special(c) {
                end = idx;
                break;
            }
            self.chars.next();
        }
        &self.input[start..end]
    }

    /// Returns the next token with its position, or None if at end of input.
    pub fn next_token(&mut self) -> Option<PositionedToken> {
        loop {
            let (position, c) = self.chars.next()?;
            let token = match c {
                '&' => QueryToken::And,
                '|' => QueryToken::Or,
                '(' => QueryToken::OpenParen,
                ')' => QueryToken::CloseParen,
                '=' => QueryToken::Operator(Operator::Equals),
                '!' => {
                    if self.eat('=') {
                        QueryToken::Operator(Operator::EqualsNot)
                    } else {
                        QueryToken::Not
                    }
                }
                '>' => {
                    if self.eat('=') {
                        QueryToken::Operator(Operator::GreaterEq)
                    } else {
                        QueryToken::Operator(Operator::Greater)
                    }
                }
                '<' => {
                    if self.eat('=') {
                        QueryToken::Operator(Operator::LessEq)
                    } else {
                        QueryToken::Operator(Operator::Less)
                    }
                }
                _ => {
                    let text = self.read_text(position).trim();
                    if text.is_empty() {
                        // Whitespace between operators carries no meaning
                        continue;
                    }
                    let offset = position + self.input[position..].find(text).unwrap_or(0);
                    return Some(PositionedToken {
                        token: QueryToken::Text(text.to_string()),
                        position: offset,
                    });
                }
            };
            return Some(PositionedToken { token, position });
        }
    }

    /// Tokenizes the entire input, keeping positions.
    pub fn tokenize(mut self) -> Vec<PositionedToken> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }
}
