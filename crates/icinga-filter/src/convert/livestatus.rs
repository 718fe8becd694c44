//! Livestatus filter headers.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use serde::Serialize;

use super::{ColumnMapper, Converter};
use crate::filter::{resolve_value, wildcard_regex_source, Condition, Node, NodeType, Operator, Tree, Value};

/// Livestatus `Filter:`, `And:` and `Or:` header lines in stack order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LivestatusQuery {
    /// Header lines, without trailing newlines.
    pub lines: Vec<String>,
}

impl LivestatusQuery {
    /// Returns true if there are no filter lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for LivestatusQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// Converts filter trees into Livestatus filter headers.
///
/// Wildcards become anchored case-insensitive regular expressions (`~~`),
/// conjunctions become `And: n`/`Or: n` over the filters on the stack.
///
/// # Example
///
/// ```
/// use icinga_filter::convert::{Converter, IdentityMapper, LivestatusConverter};
/// use icinga_filter::filter::QueryParser;
///
/// let tree = QueryParser::parse("host_name=web*&state>=1").tree;
/// let query = LivestatusConverter::new().convert(&tree, &IdentityMapper);
/// assert_eq!(
///     query.to_string(),
///     "Filter: host_name ~~ ^web.*$\nFilter: state >= 1\nAnd: 2"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct LivestatusConverter {
    now: DateTime<Utc>,
}

impl Default for LivestatusConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl LivestatusConverter {
    /// Creates a converter resolving time strings against the current time.
    pub fn new() -> Self {
        Self { now: Utc::now() }
    }

    /// Sets the reference time for time strings.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Emits `node`, returning how many filters it left on the stack (0 or 1).
    fn node<M: ColumnMapper + ?Sized>(&self, node: &Node, mapper: &M, lines: &mut Vec<String>) -> usize {
        match node {
            Node::Condition(condition) => self.condition(condition, mapper, lines),
            Node::And(_, _) | Node::Or(_, _) => {
                let kind = node.node_type();
                let mut count = 0;
                self.chain(node, kind, mapper, lines, &mut count);
                combine(lines, kind, count)
            }
        }
    }

    /// Emits a run of same-kind branches as one flat `And:`/`Or:` operand list.
    fn chain<M: ColumnMapper + ?Sized>(
        &self,
        node: &Node,
        kind: NodeType,
        mapper: &M,
        lines: &mut Vec<String>,
        count: &mut usize,
    ) {
        match node {
            Node::And(left, right) | Node::Or(left, right) if node.node_type() == kind => {
                self.chain(left, kind, mapper, lines, count);
                self.chain(right, kind, mapper, lines, count);
            }
            other => *count += self.node(other, mapper, lines),
        }
    }

    fn condition<M: ColumnMapper + ?Sized>(
        &self,
        condition: &Condition,
        mapper: &M,
        lines: &mut Vec<String>,
    ) -> usize {
        let Some(column) = mapper.map_column(&condition.column) else {
            debug!("skipping unmapped column {:?}", condition.column);
            return 0;
        };
        let column = sanitize(&column);
        let operator = condition.operator;

        if let [Value::Bool(flag)] = condition.values.as_slice() {
            if operator.is_equality() {
                let truthy = (operator == Operator::Equals) == *flag;
                let token = if truthy { "!=" } else { "=" };
                lines.push(format!("Filter: {column} {token} 0"));
                return 1;
            }
        }

        let timestamp = condition.is_time_string() || mapper.is_timestamp(&condition.column);
        let mut count = 0;
        for value in &condition.values {
            let line = if timestamp {
                match resolve_value(value, self.now) {
                    Some(ts) => format!("Filter: {column} {} {ts}", operator.token()),
                    None => continue,
                }
            } else if value.is_wildcard() && operator.is_equality() {
                let regex = wildcard_regex_source(&value.as_text());
                let token = if operator == Operator::Equals { "~~" } else { "!~~" };
                format!("Filter: {column} {token} {}", sanitize(&regex))
            } else {
                format!("Filter: {column} {} {}", operator.token(), sanitize(&value.as_text()))
            };
            lines.push(line);
            count += 1;
        }

        // Any literal may match, except for != where none may
        let kind = if operator == Operator::EqualsNot { NodeType::And } else { NodeType::Or };
        if count == 0 {
            // `Or: 0` never matches and `And: 0` always does
            lines.push(format!("{}: 0", header(kind)));
            return 1;
        }
        combine(lines, kind, count)
    }
}

impl Converter for LivestatusConverter {
    type Output = LivestatusQuery;

    fn convert<M: ColumnMapper + ?Sized>(&self, tree: &Tree, mapper: &M) -> LivestatusQuery {
        let mut lines = Vec::new();
        if let Some(root) = tree.root() {
            self.node(root, mapper, &mut lines);
        }
        trace!("compiled {} Livestatus filter lines", lines.len());
        LivestatusQuery { lines }
    }
}

/// Combines the last `count` filters; returns how many remain from them.
fn combine(lines: &mut Vec<String>, kind: NodeType, count: usize) -> usize {
    if count > 1 {
        lines.push(format!("{}: {count}", header(kind)));
    }
    count.min(1)
}

fn header(kind: NodeType) -> &'static str {
    match kind {
        NodeType::Or => "Or",
        NodeType::And | NodeType::Operator => "And",
    }
}

/// Keeps values on a single header line.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
