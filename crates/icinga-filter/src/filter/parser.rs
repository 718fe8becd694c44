//! Lenient parser for filter query strings.

use std::collections::BTreeSet;

use log::{debug, trace};
use strsim::levenshtein;

use super::error::{FilterError, FilterResult};
use super::lexer::{Lexer, PositionedToken, QueryToken};
use super::node::{join, Node, Operator, Tree, ValueContext};
use super::serializer::decode_component;
use super::value::Value;

/// Maximum edit distance for "did you mean" column suggestions.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Deepest parenthesis nesting the parser descends into.
pub const MAX_NESTING_DEPTH: usize = 64;

/// How `&` and `|` bind relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precedence {
    /// `&` binds tighter than `|`: `a|b&c` is `a|(b&c)`.
    #[default]
    AndBindsTighter,
    /// `&` and `|` have equal precedence and apply left to right:
    /// `a|b&c` is `(a|b)&c`.
    LeftToRight,
}

impl Precedence {
    /// Binding power of a conjunction token; higher binds tighter.
    fn binding_power(self, token: &QueryToken) -> Option<u8> {
        match (self, token) {
            (Precedence::AndBindsTighter, QueryToken::Or) => Some(1),
            (Precedence::AndBindsTighter, QueryToken::And) => Some(2),
            (Precedence::LeftToRight, QueryToken::Or | QueryToken::And) => Some(1),
            _ => None,
        }
    }
}

/// Options controlling how query strings are parsed.
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    /// Conjunction precedence.
    pub precedence: Precedence,
    /// If set, conditions on other columns are dropped.
    pub allowed_columns: Option<BTreeSet<String>>,
    /// Columns whose values are time strings.
    pub timestamp_columns: BTreeSet<String>,
}

impl ParserOptions {
    /// Sets the conjunction precedence.
    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// Restricts parsing to the given columns.
    pub fn with_allowed_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Marks columns whose values are time strings.
    pub fn with_timestamp_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.timestamp_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of a lenient parse: the tree built from every valid fragment,
/// plus the problems that caused fragments to be dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// The parsed tree.
    pub tree: Tree,
    /// Dropped fragments, in input order.
    pub issues: Vec<FilterError>,
}

impl ParseResult {
    /// Returns true if nothing had to be dropped.
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the tree, or the first issue if anything was dropped.
    pub fn into_strict(self) -> FilterResult<Tree> {
        match self.issues.into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(self.tree),
        }
    }
}

/// Parser for filter query strings such as `host=web*&state!=0|problem`.
///
/// # Grammar
///
/// ```text
/// query      ::= expression
/// expression ::= unary (("&" | "|") unary)*
/// unary      ::= "!"* primary
/// primary    ::= "(" expression ")" | conjunct
/// conjunct   ::= column [operator values]
/// values     ::= value ("|" value)*              (only after "=" and "!=")
///              | "(" value ("|" value)* ")"
/// ```
///
/// A bare column means `column = true`; `!` negates the following unary
/// expression. After `column=value`, a `|` followed by text that is not itself
/// followed by an operator adds another alternative value, so
/// `host=a|b&state=1` means `host ∈ {a, b} & state = 1`.
///
/// Parsing never fails: fragments that cannot be understood are dropped and
/// reported in [`ParseResult::issues`], and a conjunction that lost one side
/// collapses to the other. Groups nested deeper than [`MAX_NESTING_DEPTH`]
/// are dropped whole with [`FilterError::NestingTooDeep`].
///
/// # Example
///
/// ```
/// use icinga_filter::filter::{NodeType, QueryParser};
///
/// let result = QueryParser::parse("test=&attr1!=Hans+Wurst");
/// assert_eq!(result.tree.to_string(), "attr1!=Hans+Wurst");
/// assert!(!result.is_complete());
/// assert_eq!(result.tree.root().unwrap().node_type(), NodeType::Operator);
/// ```
pub struct QueryParser<'o> {
    tokens: Vec<PositionedToken>,
    position: usize,
    depth: usize,
    options: &'o ParserOptions,
    issues: Vec<FilterError>,
}

impl<'o> QueryParser<'o> {
    /// Parses a query string with default options.
    pub fn parse(input: &str) -> ParseResult {
        Self::parse_with(input, &ParserOptions::default())
    }

    /// Parses a query string with the given options.
    pub fn parse_with(input: &str, options: &ParserOptions) -> ParseResult {
        let tokens = Lexer::new(input).tokenize();
        let mut parser = QueryParser {
            tokens,
            position: 0,
            depth: 0,
            options,
            issues: Vec::new(),
        };

        let mut root = None;
        loop {
            let node = parser.parse_expression(0);
            root = join(root, node, Node::and);

            // Anything left here could not continue the expression; skip it
            // and keep parsing what follows.
            match parser.advance() {
                Some(stray) => {
                    let issue = FilterError::unexpected_token(stray.token.describe(), stray.position);
                    parser.issues.push(issue);
                }
                None => break,
            }
        }

        for issue in &parser.issues {
            debug!("dropped filter fragment in {input:?}: {issue}");
        }

        ParseResult {
            tree: Tree::new(root),
            issues: parser.issues,
        }
    }

    /// Parses a query string, failing on the first dropped fragment.
    pub fn parse_strict(input: &str, options: &ParserOptions) -> FilterResult<Tree> {
        Self::parse_with(input, options).into_strict()
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&QueryToken> {
        self.peek_at(0)
    }

    /// Returns the token `offset` positions ahead without consuming anything.
    fn peek_at(&self, offset: usize) -> Option<&QueryToken> {
        self.tokens.get(self.position + offset).map(|t| &t.token)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Option<PositionedToken> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Byte position of the current token, or the end of input.
    fn current_position(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|t| t.position)
            .unwrap_or(0)
    }

    /// Checks if the current token matches the expected token.
    fn check(&self, expected: &QueryToken) -> bool {
        self.peek() == Some(expected)
    }

    /// Parses conjunction chains whose binding power is at least `min_power`.
    fn parse_expression(&mut self, min_power: u8) -> Option<Node> {
        let mut left = self.parse_unary();

        loop {
            let Some(token) = self.peek() else {
                break;
            };
            let Some(power) = self.options.precedence.binding_power(token) else {
                break;
            };
            if power < min_power {
                break;
            }
            let combine: fn(Node, Node) -> Node = if *token == QueryToken::And {
                Node::and
            } else {
                Node::or
            };
            self.advance();
            // Equal powers on the right keep chains left-associative
            let right = self.parse_expression(power + 1);
            left = join(left, right, combine);
        }

        left
    }

    /// Parses `"!"* primary`; an even number of `!` cancels out.
    fn parse_unary(&mut self) -> Option<Node> {
        let mut negations = 0usize;
        while self.check(&QueryToken::Not) {
            self.advance();
            negations += 1;
        }
        let node = self.parse_primary();
        if negations % 2 == 1 {
            node.map(Node::negate)
        } else {
            node
        }
    }

    /// Parses a group or a single conjunct.
    fn parse_primary(&mut self) -> Option<Node> {
        match self.peek()? {
            QueryToken::OpenParen => {
                let open = self.advance()?;
                if self.depth >= MAX_NESTING_DEPTH {
                    self.skip_group();
                    self.issues.push(FilterError::NestingTooDeep {
                        position: open.position,
                    });
                    return None;
                }
                self.depth += 1;
                let inner = self.parse_expression(0);
                self.depth -= 1;
                if self.check(&QueryToken::CloseParen) {
                    self.advance();
                } else {
                    self.issues.push(FilterError::UnclosedParenthesis {
                        position: open.position,
                    });
                }
                inner
            }
            QueryToken::Text(_) => self.parse_conjunct(),
            QueryToken::Operator(_) => {
                // An operator with no column; drop it together with its value
                let token = self.advance()?;
                if matches!(self.peek(), Some(QueryToken::Text(_))) {
                    self.advance();
                }
                self.issues.push(FilterError::EmptyColumn {
                    operator: token.token.describe(),
                    position: token.position,
                });
                None
            }
            // Conjunctions and closing parentheses are handled by the callers
            QueryToken::And | QueryToken::Or | QueryToken::CloseParen | QueryToken::Not => None,
        }
    }

    /// Skips past the `)` closing a group whose `(` was just consumed.
    fn skip_group(&mut self) {
        let mut open = 1usize;
        while let Some(token) = self.advance() {
            match token.token {
                QueryToken::OpenParen => open += 1,
                QueryToken::CloseParen => {
                    open -= 1;
                    if open == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Parses `column [operator values]`.
    fn parse_conjunct(&mut self) -> Option<Node> {
        let start = self.advance()?;
        let QueryToken::Text(raw) = start.token else {
            return None;
        };
        let column = decode_component(&raw).trim().to_string();

        let (operator, values) = match self.peek() {
            Some(QueryToken::Operator(op)) => {
                let op = *op;
                self.advance();
                (op, self.parse_values(op))
            }
            _ => (Operator::Equals, vec![Value::Bool(true)]),
        };

        if !is_valid_column(&column) {
            self.issues.push(FilterError::InvalidColumn {
                column,
                position: start.position,
            });
            return None;
        }
        if let Some(allowed) = &self.options.allowed_columns {
            if !allowed.contains(&column) {
                let suggestion = find_similar_column(&column, allowed.iter().map(String::as_str));
                self.issues.push(FilterError::UnknownColumn {
                    column,
                    position: start.position,
                    suggestion,
                });
                return None;
            }
        }
        if values.is_empty() {
            let position = self.current_position();
            self.issues.push(FilterError::missing_value(column, position));
            return None;
        }

        let context = self
            .options
            .timestamp_columns
            .contains(&column)
            .then_some(ValueContext::TimeString);
        trace!("parsed condition {column} {operator} {values:?}");
        Some(Node::condition(column, operator, values, context))
    }

    /// Parses the value list following an operator.
    fn parse_values(&mut self, operator: Operator) -> Vec<Value> {
        match self.peek() {
            Some(QueryToken::OpenParen) => self.parse_value_list(),
            Some(QueryToken::Text(_)) => {
                let mut values = vec![self.take_value()];
                if operator.is_equality() {
                    while self.at_alternative_value() {
                        self.advance();
                        values.push(self.take_value());
                    }
                }
                values
            }
            _ => Vec::new(),
        }
    }

    /// Parses `"(" value ("|" value)* ")"`.
    fn parse_value_list(&mut self) -> Vec<Value> {
        let open_position = self.current_position();
        self.advance();
        let mut values = Vec::new();
        loop {
            match self.peek() {
                Some(QueryToken::Text(_)) => values.push(self.take_value()),
                Some(QueryToken::Or) => {
                    self.advance();
                }
                Some(QueryToken::CloseParen) => {
                    self.advance();
                    break;
                }
                _ => {
                    self.issues.push(FilterError::UnclosedParenthesis {
                        position: open_position,
                    });
                    break;
                }
            }
        }
        values
    }

    /// Returns true at `| text` where the text does not start a new condition.
    fn at_alternative_value(&self) -> bool {
        matches!(self.peek_at(0), Some(QueryToken::Or))
            && matches!(self.peek_at(1), Some(QueryToken::Text(_)))
            && !matches!(self.peek_at(2), Some(QueryToken::Operator(_)))
    }

    /// Consumes a text token and decodes it into a value.
    fn take_value(&mut self) -> Value {
        match self.advance().map(|t| t.token) {
            Some(QueryToken::Text(raw)) => Value::String(decode_component(&raw)),
            _ => Value::Null,
        }
    }
}

/// Returns true for identifiers such as `host_name` or `host.state`.
pub(crate) fn is_valid_column(column: &str) -> bool {
    let mut chars = column.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// Finds the allowed column closest to `column` by edit distance.
///
/// Returns the best match if its edit distance is within the threshold,
/// otherwise returns `None`.
fn find_similar_column<'a>(column: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    let query_lower = column.to_lowercase();

    let (best_match, best_distance) = candidates
        .map(|name| (name, levenshtein(&query_lower, &name.to_lowercase())))
        .min_by_key(|(_, d)| *d)?;

    if best_distance <= MAX_SUGGESTION_DISTANCE {
        Some(best_match.to_string())
    } else {
        None
    }
}
