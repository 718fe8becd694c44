//! In-memory evaluation of filter trees against rows.
//!
//! This module provides the [`FilterEvaluator`] for matching parsed or
//! programmatically built filter trees against row-like data without a backend.
//!
//! # Example
//!
//! ```
//! use icinga_filter::filter::{FilterContext, FilterEvaluator, QueryParser, Record, Value};
//!
//! let tree = QueryParser::parse("service=www*&state!=0").tree;
//! let context = FilterContext::new();
//! let evaluator = FilterEvaluator::new(&tree, &context);
//!
//! let mut row = Record::new();
//! row.insert("service".to_string(), Value::from("www.icinga.org"));
//! row.insert("state".to_string(), Value::from("2"));
//! assert!(evaluator.matches(&row));
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use log::warn;
use regex::{Regex, RegexBuilder};

use super::node::{Condition, Node, Operator, Tree};
use super::timestring::resolve_value;
use super::value::{Row, Value};

/// Context for filter evaluation.
///
/// Holds everything evaluation depends on besides the tree and the row, so
/// the same tree, row and context always give the same answer.
#[derive(Debug, Clone)]
pub struct FilterContext {
    now: DateTime<Utc>,
    known_columns: Option<BTreeSet<String>>,
    timestamp_columns: BTreeSet<String>,
}

impl Default for FilterContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterContext {
    /// Creates a context whose reference time is the current time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Creates a context with a fixed reference time for time strings.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            known_columns: None,
            timestamp_columns: BTreeSet::new(),
        }
    }

    /// Restricts evaluation to the given columns.
    ///
    /// Conditions on any other column contribute no constraint, the same way
    /// backend converters skip columns they cannot map.
    pub fn with_known_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Marks columns whose values are always compared as timestamps.
    pub fn with_timestamp_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.timestamp_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the reference time.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Returns true if conditions on `column` take part in evaluation.
    pub fn is_known_column(&self, column: &str) -> bool {
        self.known_columns
            .as_ref()
            .map_or(true, |columns| columns.contains(column))
    }

    fn is_timestamp(&self, condition: &Condition) -> bool {
        condition.is_time_string() || self.timestamp_columns.contains(&condition.column)
    }
}

/// Evaluates a filter tree against rows.
///
/// Wildcard patterns are compiled once when the evaluator is created.
#[derive(Debug)]
pub struct FilterEvaluator<'a> {
    tree: &'a Tree,
    context: &'a FilterContext,
    patterns: HashMap<String, Regex>,
}

impl<'a> FilterEvaluator<'a> {
    /// Creates a new filter evaluator.
    ///
    /// # Arguments
    ///
    /// * `tree` - The filter tree to evaluate
    /// * `context` - Reference time and column settings
    pub fn new(tree: &'a Tree, context: &'a FilterContext) -> Self {
        let mut patterns = HashMap::new();
        for condition in tree.conditions() {
            if condition.operator.is_equality() {
                for value in condition.values.iter().filter(|v| v.is_wildcard()) {
                    let pattern = value.as_text().into_owned();
                    if patterns.contains_key(&pattern) {
                        continue;
                    }
                    match compile_wildcard(&pattern) {
                        Ok(regex) => {
                            patterns.insert(pattern, regex);
                        }
                        Err(err) => warn!("cannot compile wildcard {pattern:?}: {err}"),
                    }
                }
            }
        }
        Self {
            tree,
            context,
            patterns,
        }
    }

    /// Returns true if the row matches the filter. The empty tree matches everything.
    pub fn matches(&self, row: &impl Row) -> bool {
        match self.tree.root() {
            Some(root) => self.evaluate_node(root, row).unwrap_or(true),
            None => true,
        }
    }

    /// Filters a slice of rows, returning only those that match.
    pub fn filter_rows<'b, R: Row>(&self, rows: &'b [R]) -> Vec<&'b R> {
        rows.iter().filter(|row| self.matches(*row)).collect()
    }

    /// Evaluates a node; `None` means the node places no constraint.
    fn evaluate_node(&self, node: &Node, row: &impl Row) -> Option<bool> {
        match node {
            Node::Condition(condition) => self.evaluate_condition(condition, row),
            Node::And(left, right) => match self.evaluate_node(left, row) {
                Some(false) => Some(false),
                Some(true) => Some(self.evaluate_node(right, row).unwrap_or(true)),
                None => self.evaluate_node(right, row),
            },
            Node::Or(left, right) => match self.evaluate_node(left, row) {
                Some(true) => Some(true),
                Some(false) => Some(self.evaluate_node(right, row).unwrap_or(false)),
                None => self.evaluate_node(right, row),
            },
        }
    }

    fn evaluate_condition(&self, condition: &Condition, row: &impl Row) -> Option<bool> {
        if !self.context.is_known_column(&condition.column) {
            return None;
        }

        let value = row.value(&condition.column).filter(|v| !v.is_null());
        let result = match condition.operator {
            Operator::Equals => value.is_some_and(|v| self.equals_any(condition, &v)),
            Operator::EqualsNot => !value.is_some_and(|v| self.equals_any(condition, &v)),
            op => value.is_some_and(|v| self.compare_any(condition, op, &v)),
        };
        Some(result)
    }

    /// True if `value` equals any literal of the condition.
    fn equals_any(&self, condition: &Condition, value: &Value) -> bool {
        let timestamp = self.context.is_timestamp(condition);
        condition.values.iter().any(|literal| {
            if timestamp && !matches!(literal, Value::Bool(_)) {
                return self.compare(literal, value, true) == Some(Ordering::Equal);
            }
            self.equals(literal, value)
        })
    }

    fn equals(&self, literal: &Value, value: &Value) -> bool {
        match literal {
            Value::Bool(flag) => value.is_truthy() == *flag,
            _ if literal.is_wildcard() => {
                let pattern = literal.as_text();
                self.patterns
                    .get(pattern.as_ref())
                    .is_some_and(|regex| regex.is_match(&value.as_text()))
            }
            _ => match literal.numeric_cmp(value) {
                Some(ordering) => ordering == Ordering::Equal,
                None => literal.as_text() == value.as_text(),
            },
        }
    }

    /// True if `value op literal` holds for any literal.
    fn compare_any(&self, condition: &Condition, op: Operator, value: &Value) -> bool {
        let timestamp = self.context.is_timestamp(condition);
        condition.values.iter().any(|literal| {
            let Some(ordering) = self.compare(literal, value, timestamp) else {
                return false;
            };
            match op {
                Operator::Greater => ordering == Ordering::Greater,
                Operator::GreaterEq => ordering != Ordering::Less,
                Operator::Less => ordering == Ordering::Less,
                Operator::LessEq => ordering != Ordering::Greater,
                Operator::Equals | Operator::EqualsNot => false,
            }
        })
    }

    /// Orders the row value relative to the literal.
    fn compare(&self, literal: &Value, value: &Value, timestamp: bool) -> Option<Ordering> {
        if timestamp {
            let now = self.context.now();
            let left = resolve_value(&normalize_time(value), now)?;
            let right = resolve_value(literal, now)?;
            return Some(left.cmp(&right));
        }
        match (value.as_number(), literal.as_number()) {
            (Some(_), Some(_)) => value.numeric_cmp(literal),
            _ => Some(value.as_text().cmp(&literal.as_text())),
        }
    }
}

/// Booleans are not time values; keep other values as they are.
fn normalize_time(value: &Value) -> Value {
    match value {
        Value::Bool(_) => Value::Null,
        other => other.clone(),
    }
}

/// Compiles a `*` glob into an anchored, case-insensitive regex.
pub(crate) fn compile_wildcard(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&wildcard_regex_source(pattern))
        .case_insensitive(true)
        .build()
}

/// Builds the anchored regex source for a `*` glob.
pub(crate) fn wildcard_regex_source(pattern: &str) -> String {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("^{body}$")
}

/// Returns true if `tree` matches `row`, using a default context.
pub fn matches(tree: &Tree, row: &impl Row) -> bool {
    let context = FilterContext::new();
    FilterEvaluator::new(tree, &context).matches(row)
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod evaluator_tests;
