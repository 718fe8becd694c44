//! Programmatic filter construction.

use std::fmt;

use super::evaluator::{FilterContext, FilterEvaluator};
use super::node::{join, Node, Operator, Tree, ValueContext};
use super::parser::{ParseResult, ParserOptions, QueryParser};
use super::value::{IntoValues, Row};

/// How [`Filter::add_filter`] joins another filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    /// Joined filters must all match.
    #[default]
    All,
    /// Any joined filter may match.
    Any,
}

impl Conjunction {
    fn combine(self) -> fn(Node, Node) -> Node {
        match self {
            Conjunction::All => Node::and,
            Conjunction::Any => Node::or,
        }
    }
}

/// A filter built from combinators or parsed from a query string.
///
/// Cloning copies the whole tree, so a clone can be specialised (for
/// example with [`Filter::rename_column`]) without touching the original.
///
/// # Example
///
/// ```
/// use icinga_filter::filter::{Filter, Record, Value};
///
/// let filter = Filter::match_all([
///     Filter::where_("service", ["ping", "www*"]),
///     Filter::where_("handled", false),
/// ]);
/// assert_eq!(filter.to_query_string(), "service=ping|www%2A&handled=0");
///
/// let mut row = Record::new();
/// row.insert("service".to_string(), Value::from("www.icinga.org"));
/// row.insert("handled".to_string(), Value::from(0));
/// assert!(filter.matches(&row));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    kind: Conjunction,
    tree: Tree,
}

impl Filter {
    /// Creates the empty filter, which matches every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = values`, matching if the row value equals any of the values.
    pub fn where_(column: impl Into<String>, values: impl IntoValues) -> Self {
        Self::where_op(column, Operator::Equals, values)
    }

    /// `column <operator> values`.
    pub fn where_op(column: impl Into<String>, operator: Operator, values: impl IntoValues) -> Self {
        Self::leaf(column, operator, values, None)
    }

    /// Like [`Filter::where_op`], but the values are time strings such as
    /// `-1 day` that are resolved to timestamps before comparing.
    pub fn where_time(
        column: impl Into<String>,
        operator: Operator,
        values: impl IntoValues,
    ) -> Self {
        Self::leaf(column, operator, values, Some(ValueContext::TimeString))
    }

    fn leaf(
        column: impl Into<String>,
        operator: Operator,
        values: impl IntoValues,
        context: Option<ValueContext>,
    ) -> Self {
        let node = Node::condition(column, operator, values.into_values(), context);
        Self {
            kind: Conjunction::All,
            tree: Tree::from(node),
        }
    }

    /// Combines filters so that all of them must match.
    pub fn match_all(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::chain(Conjunction::All, filters)
    }

    /// Combines filters so that any of them may match.
    ///
    /// Without any filters the result is empty and matches every row.
    pub fn match_any(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::chain(Conjunction::Any, filters)
    }

    fn chain(kind: Conjunction, filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filter = Self {
            kind,
            tree: Tree::empty(),
        };
        for other in filters {
            filter.add_filter(other);
        }
        filter
    }

    /// Parses a query string leniently, dropping fragments it cannot understand.
    pub fn from_query_string(query: &str) -> Self {
        Self::from(QueryParser::parse(query).tree)
    }

    /// Parses a query string with options, keeping the dropped fragments.
    pub fn parse_query_string(query: &str, options: &ParserOptions) -> (Self, ParseResult) {
        let result = QueryParser::parse_with(query, options);
        (Self::from(result.tree.clone()), result)
    }

    /// Returns the canonical query string of this filter.
    pub fn to_query_string(&self) -> String {
        self.tree.to_string()
    }

    /// Returns the negated filter.
    pub fn negate(self) -> Self {
        Self {
            kind: self.kind,
            tree: self.tree.negate(),
        }
    }

    /// Adds another filter using this filter's conjunction.
    pub fn add_filter(&mut self, filter: Filter) -> &mut Self {
        let root = std::mem::take(&mut self.tree).into_root();
        let combined = join(root, filter.tree.into_root(), self.kind.combine());
        self.tree = Tree::new(combined);
        self
    }

    /// Returns true if the row matches, using a context with the current time.
    pub fn matches(&self, row: &impl Row) -> bool {
        self.matches_with(row, &FilterContext::new())
    }

    /// Returns true if the row matches under the given context.
    pub fn matches_with(&self, row: &impl Row, context: &FilterContext) -> bool {
        FilterEvaluator::new(&self.tree, context).matches(row)
    }

    /// Renames every occurrence of column `from` to `to`.
    pub fn rename_column(&mut self, from: &str, to: &str) -> &mut Self {
        self.tree.rename_column(from, to);
        self
    }

    /// Returns the conjunction used by [`Filter::add_filter`].
    pub fn conjunction(&self) -> Conjunction {
        self.kind
    }

    /// Returns true if the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the expression tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Consumes the filter, returning its tree.
    pub fn into_tree(self) -> Tree {
        self.tree
    }
}

impl From<Tree> for Filter {
    fn from(tree: Tree) -> Self {
        Self {
            kind: Conjunction::All,
            tree,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.fmt(f)
    }
}
