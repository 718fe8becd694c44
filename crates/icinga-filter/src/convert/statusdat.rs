//! In-memory predicates over status.dat objects.

use std::fmt;

use chrono::{DateTime, Utc};
use log::trace;
use serde::{Serialize, Serializer};

use super::{ColumnMapper, Converter};
use crate::filter::{FilterContext, FilterEvaluator, Tree, ValueContext};

/// A filter remapped onto status.dat object paths.
///
/// Objects are JSON values; mapped columns are dotted paths such as
/// `status.current_state` resolved through nested objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusdatPredicate {
    #[serde(serialize_with = "serialize_tree")]
    filter: Tree,
    now: DateTime<Utc>,
}

impl StatusdatPredicate {
    /// Returns the remapped tree.
    pub fn tree(&self) -> &Tree {
        &self.filter
    }

    /// Returns true if the predicate places no constraint.
    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
    }

    /// Returns true if `object` matches.
    pub fn matches(&self, object: &serde_json::Value) -> bool {
        let context = FilterContext::at(self.now);
        FilterEvaluator::new(&self.filter, &context).matches(object)
    }

    /// Returns the matching objects.
    pub fn filter_objects<'a>(&self, objects: &'a [serde_json::Value]) -> Vec<&'a serde_json::Value> {
        let context = FilterContext::at(self.now);
        FilterEvaluator::new(&self.filter, &context).filter_rows(objects)
    }
}

impl fmt::Display for StatusdatPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.filter.fmt(f)
    }
}

fn serialize_tree<S: Serializer>(tree: &Tree, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(tree)
}

/// Converts filter trees into [`StatusdatPredicate`]s.
///
/// # Example
///
/// ```
/// use icinga_filter::convert::{Converter, StatusdatConverter};
/// use icinga_filter::filter::QueryParser;
/// use serde_json::json;
///
/// let tree = QueryParser::parse("host=web*&state!=0").tree;
/// let mapper = |column: &str| match column {
///     "host" => Some("host_name".to_string()),
///     "state" => Some("status.current_state".to_string()),
///     _ => None,
/// };
/// let predicate = StatusdatConverter::new().convert(&tree, &mapper);
///
/// let object = json!({"host_name": "web01", "status": {"current_state": 2}});
/// assert!(predicate.matches(&object));
/// ```
#[derive(Debug, Clone)]
pub struct StatusdatConverter {
    now: DateTime<Utc>,
}

impl Default for StatusdatConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusdatConverter {
    /// Creates a converter resolving time strings against the current time.
    pub fn new() -> Self {
        Self { now: Utc::now() }
    }

    /// Sets the reference time for time strings.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

impl Converter for StatusdatConverter {
    type Output = StatusdatPredicate;

    fn convert<M: ColumnMapper + ?Sized>(&self, tree: &Tree, mapper: &M) -> StatusdatPredicate {
        let mut filter = tree
            .clone()
            .retain_columns(|column| mapper.map_column(column).is_some());
        filter.for_each_condition_mut(|condition| {
            if mapper.is_timestamp(&condition.column) {
                condition.context = Some(ValueContext::TimeString);
            }
            if let Some(path) = mapper.map_column(&condition.column) {
                condition.column = path;
            }
        });
        trace!("compiled status.dat predicate {filter}");
        StatusdatPredicate {
            filter,
            now: self.now,
        }
    }
}
