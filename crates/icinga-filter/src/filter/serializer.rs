//! Canonical query-string serialization of filter trees.

use std::borrow::Cow;

use super::node::{Condition, Node, Operator, Tree};
use super::parser::Precedence;
use super::value::Value;

/// Which side of its parent a child node is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Writes trees back into the query-string format the parser reads.
///
/// Parentheses are only emitted where the chosen precedence needs them, so
/// `parse(serialize(tree)) == tree` for every tree the parser produced with
/// the same precedence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer {
    precedence: Precedence,
}

impl Serializer {
    /// Creates a serializer targeting the given precedence.
    pub fn new(precedence: Precedence) -> Self {
        Self { precedence }
    }

    /// Serializes a whole tree. The empty tree serializes to `""`.
    pub fn tree(&self, tree: &Tree) -> String {
        tree.root().map(|root| self.node(root)).unwrap_or_default()
    }

    /// Serializes a single node and its children.
    pub fn node(&self, node: &Node) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Serializes a single condition.
    pub fn condition(&self, condition: &Condition) -> String {
        // `a>1|5` would read back as `a>1` or a new column `5`
        if condition.is_multi_value_ordering() {
            return format!("({})", self.node(&condition.clone().into_node()));
        }

        // `col = false` has no bare form: `!col` also matches rows without `col`
        if let [Value::Bool(true)] = condition.values.as_slice() {
            let column = encode_component(&condition.column);
            match condition.operator {
                Operator::Equals => return column.into_owned(),
                Operator::EqualsNot => return format!("!{column}"),
                _ => {}
            }
        }

        let values = condition
            .values
            .iter()
            .map(|value| encode_component(&value.as_text()).into_owned())
            .collect::<Vec<_>>()
            .join("|");
        format!(
            "{}{}{}",
            encode_component(&condition.column),
            condition.operator.token(),
            values
        )
    }

    fn write_node(&self, node: &Node, out: &mut String) {
        match node {
            Node::Condition(condition) => out.push_str(&self.condition(condition)),
            Node::And(left, right) | Node::Or(left, right) => {
                let symbol = if matches!(node, Node::And(_, _)) { '&' } else { '|' };
                self.write_child(node, left, Side::Left, out);
                out.push(symbol);
                self.write_child(node, right, Side::Right, out);
            }
        }
    }

    fn write_child(&self, parent: &Node, child: &Node, side: Side, out: &mut String) {
        if self.needs_parens(parent, child, side) {
            out.push('(');
            self.write_node(child, out);
            out.push(')');
        } else {
            self.write_node(child, out);
        }
    }

    fn needs_parens(&self, parent: &Node, child: &Node, side: Side) -> bool {
        if matches!(child, Node::Condition(_)) {
            return false;
        }
        match self.precedence {
            Precedence::AndBindsTighter => {
                let or_under_and = matches!(parent, Node::And(_, _)) && matches!(child, Node::Or(_, _));
                let same_kind_right =
                    side == Side::Right && parent.node_type() == child.node_type();
                or_under_and || same_kind_right
            }
            // Chains are read strictly left to right, so any branch on the
            // right has to be grouped.
            Precedence::LeftToRight => side == Side::Right,
        }
    }
}

/// Form-URL-encodes a column or value: spaces become `+` and every reserved
/// character, including `*`, is percent-encoded.
pub fn encode_component(text: &str) -> Cow<'_, str> {
    let encoded = urlencoding::encode(text);
    if encoded.contains("%20") {
        Cow::Owned(encoded.replace("%20", "+"))
    } else {
        encoded
    }
}

/// Decodes a form-URL-encoded column or value. Invalid UTF-8 is replaced
/// rather than rejected.
pub fn decode_component(text: &str) -> String {
    let spaced = text.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}
