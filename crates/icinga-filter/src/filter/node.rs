//! Expression tree for filter queries.

use std::collections::BTreeSet;
use std::fmt;

use super::serializer::Serializer;
use super::value::Value;

/// The kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// A `column operator values` leaf.
    Operator,
    /// Conjunction of two children.
    And,
    /// Disjunction of two children.
    Or,
}

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Equals,
    /// `!=`
    EqualsNot,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `<`
    Less,
    /// `<=`
    LessEq,
}

impl Operator {
    /// All operators, longest tokens first.
    pub const ALL: [Operator; 6] = [
        Operator::EqualsNot,
        Operator::GreaterEq,
        Operator::LessEq,
        Operator::Equals,
        Operator::Greater,
        Operator::Less,
    ];

    /// Returns the query-string token of this operator.
    pub fn token(self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::EqualsNot => "!=",
            Operator::Greater => ">",
            Operator::GreaterEq => ">=",
            Operator::Less => "<",
            Operator::LessEq => "<=",
        }
    }

    /// Returns the logical complement of this operator.
    pub fn negated(self) -> Operator {
        match self {
            Operator::Equals => Operator::EqualsNot,
            Operator::EqualsNot => Operator::Equals,
            Operator::Greater => Operator::LessEq,
            Operator::GreaterEq => Operator::Less,
            Operator::Less => Operator::GreaterEq,
            Operator::LessEq => Operator::Greater,
        }
    }

    /// Returns true for `=` and `!=`, the operators that accept alternative values.
    pub fn is_equality(self) -> bool {
        matches!(self, Operator::Equals | Operator::EqualsNot)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Hint telling consumers how to interpret the right-hand values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueContext {
    /// Values are time expressions (`yesterday`, `-2 hours`, ...) resolved to
    /// Unix timestamps before comparing.
    TimeString,
}

/// A leaf of the expression tree: `column operator values`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// The column (left-hand side).
    pub column: String,
    /// The comparison operator.
    pub operator: Operator,
    /// Ordered literal values (right-hand side). Multiple values are
    /// alternatives: `=` matches any of them, `!=` matches none of them, and
    /// an ordering operator matches if it holds for any of them.
    pub values: Vec<Value>,
    /// Optional interpretation hint for the values.
    pub context: Option<ValueContext>,
}

impl Condition {
    /// Creates a condition without context.
    pub fn new(column: impl Into<String>, operator: Operator, values: Vec<Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            values,
            context: None,
        }
    }

    /// Sets the value context.
    pub fn with_context(mut self, context: ValueContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns true if the values must be resolved as time strings.
    pub fn is_time_string(&self) -> bool {
        self.context == Some(ValueContext::TimeString)
    }

    /// Returns the complement of this condition.
    ///
    /// Only exact for single values and for `=`/`!=`; [`Node::negate`]
    /// splits multi-value ordering conditions before negating them.
    pub fn negated(&self) -> Self {
        Self {
            operator: self.operator.negated(),
            ..self.clone()
        }
    }

    /// Returns true for an ordering operator with several alternative values.
    pub fn is_multi_value_ordering(&self) -> bool {
        !self.operator.is_equality() && self.values.len() > 1
    }

    /// Turns a multi-value ordering condition into an OR chain of
    /// single-value leaves; any other condition becomes a single leaf.
    pub fn into_node(self) -> Node {
        if !self.is_multi_value_ordering() {
            return Node::Condition(self);
        }
        let Condition {
            column,
            operator,
            values,
            context,
        } = self;
        values
            .into_iter()
            .map(|value| {
                Node::Condition(Condition {
                    column: column.clone(),
                    operator,
                    values: vec![value],
                    context,
                })
            })
            .reduce(Node::or)
            .unwrap_or_else(|| Node::Condition(Condition::new(column.clone(), operator, Vec::new())))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Serializer::default().condition(self))
    }
}

/// A node of the expression tree.
///
/// Branches always have exactly two children; n-ary conjunctions are nested.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Leaf condition.
    Condition(Condition),
    /// Both children must match.
    And(Box<Node>, Box<Node>),
    /// At least one child must match.
    Or(Box<Node>, Box<Node>),
}

impl Node {
    /// Creates a leaf node.
    ///
    /// An ordering operator with several values becomes an OR chain of
    /// single-value leaves, so `a>1|5` is built as `a>1|a>5`.
    pub fn condition(
        column: impl Into<String>,
        operator: Operator,
        values: Vec<Value>,
        context: Option<ValueContext>,
    ) -> Self {
        Condition {
            column: column.into(),
            operator,
            values,
            context,
        }
        .into_node()
    }

    /// Creates an AND node.
    pub fn and(left: Node, right: Node) -> Self {
        Node::And(Box::new(left), Box::new(right))
    }

    /// Creates an OR node.
    pub fn or(left: Node, right: Node) -> Self {
        Node::Or(Box::new(left), Box::new(right))
    }

    /// Returns the node type.
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Condition(_) => NodeType::Operator,
            Node::And(_, _) => NodeType::And,
            Node::Or(_, _) => NodeType::Or,
        }
    }

    /// Returns the leaf condition, if this is one.
    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            Node::Condition(condition) => Some(condition),
            _ => None,
        }
    }

    /// Returns the logical negation of this node.
    ///
    /// Negation is pushed down to the leaves: branches swap kind (De Morgan)
    /// and conditions take the complementary operator.
    pub fn negate(self) -> Self {
        match self {
            Node::Condition(condition) if condition.is_multi_value_ordering() => {
                condition.into_node().negate()
            }
            Node::Condition(condition) => Node::Condition(condition.negated()),
            Node::And(left, right) => Node::or(left.negate(), right.negate()),
            Node::Or(left, right) => Node::and(left.negate(), right.negate()),
        }
    }

    /// Number of leaves below (and including) this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Condition(_) => 1,
            Node::And(left, right) | Node::Or(left, right) => {
                left.leaf_count() + right.leaf_count()
            }
        }
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            Node::Condition(condition) => out.push(condition),
            Node::And(left, right) | Node::Or(left, right) => {
                left.collect_conditions(out);
                right.collect_conditions(out);
            }
        }
    }

    fn for_each_condition_mut(&mut self, f: &mut impl FnMut(&mut Condition)) {
        match self {
            Node::Condition(condition) => f(condition),
            Node::And(left, right) | Node::Or(left, right) => {
                left.for_each_condition_mut(f);
                right.for_each_condition_mut(f);
            }
        }
    }

    /// Removes leaves rejected by `keep`; a branch left with one child collapses to it.
    fn retain(self, keep: &impl Fn(&Condition) -> bool) -> Option<Node> {
        match self {
            Node::Condition(condition) => keep(&condition).then_some(Node::Condition(condition)),
            Node::And(left, right) => {
                join(left.retain(keep), right.retain(keep), Node::and)
            }
            Node::Or(left, right) => join(left.retain(keep), right.retain(keep), Node::or),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Serializer::default().node(self))
    }
}

/// Joins two optional sides; a missing side collapses to the other one.
pub(crate) fn join(
    left: Option<Node>,
    right: Option<Node>,
    combine: fn(Node, Node) -> Node,
) -> Option<Node> {
    match (left, right) {
        (Some(left), Some(right)) => Some(combine(left, right)),
        (Some(node), None) | (None, Some(node)) => Some(node),
        (None, None) => None,
    }
}

/// A filter expression tree. The empty tree matches every row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    root: Option<Node>,
}

impl Tree {
    /// Creates a tree from an optional root.
    pub fn new(root: Option<Node>) -> Self {
        Self { root }
    }

    /// Creates the empty (match everything) tree.
    pub fn empty() -> Self {
        Self { root: None }
    }

    /// Returns the root node.
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// Consumes the tree, returning its root.
    pub fn into_root(self) -> Option<Node> {
        self.root
    }

    /// Returns true if the tree has no root.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns every condition, depth-first from left to right.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.collect_conditions(&mut out);
        }
        out
    }

    /// Returns the distinct columns referenced by the tree.
    pub fn columns(&self) -> BTreeSet<&str> {
        self.conditions()
            .into_iter()
            .map(|condition| condition.column.as_str())
            .collect()
    }

    /// Removes every condition whose column fails `keep`.
    ///
    /// A conjunction that loses one side collapses to the other one, so
    /// `a=1&b=2` without `b` becomes `a=1`.
    pub fn retain_columns(self, keep: impl Fn(&str) -> bool) -> Tree {
        let root = self
            .root
            .and_then(|root| root.retain(&|condition: &Condition| keep(&condition.column)));
        Tree { root }
    }

    /// Renames every occurrence of column `from` to `to`.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(root) = &mut self.root {
            root.for_each_condition_mut(&mut |condition| {
                if condition.column == from {
                    condition.column = to.to_string();
                }
            });
        }
    }

    /// Applies `f` to every condition.
    pub fn for_each_condition_mut(&mut self, mut f: impl FnMut(&mut Condition)) {
        if let Some(root) = &mut self.root {
            root.for_each_condition_mut(&mut f);
        }
    }

    /// Returns the negated tree. The empty tree stays empty.
    pub fn negate(self) -> Tree {
        Tree {
            root: self.root.map(Node::negate),
        }
    }
}

impl From<Node> for Tree {
    fn from(node: Node) -> Self {
        Tree::new(Some(node))
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Serializer::default().tree(self))
    }
}
