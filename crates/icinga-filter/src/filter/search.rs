//! Natural-language search over typed attributes.
//!
//! A search box query such as
//! `host name contains web and host is with problem since 1 hour` is split
//! at `and`/`or` into parts. Each part names a [`SearchDomain`] (`host`), an
//! attribute of that domain (`name`) and a typed clause (`contains web`)
//! that the attribute's [`SearchType`] turns into a condition.
//!
//! Proposals for the part being typed mark the already typed prefix with
//! braces: typing `starts` proposes `{Starts} With`.
//!
//! # Example
//!
//! ```
//! use icinga_filter::filter::{SearchAttribute, SearchBox, SearchDomain};
//!
//! let search = SearchBox::new().with_domain(
//!     SearchDomain::new("Host")
//!         .with_attribute(SearchAttribute::text().handles(["name"]))
//!         .with_attribute(SearchAttribute::text().handles(["address"])),
//! );
//! let result = search.parse("host name starts with web and host address is 10.0.0.1");
//! assert!(result.ignored.is_empty());
//! assert_eq!(result.tree.conditions().len(), 2);
//!
//! assert_eq!(search.proposals("host name sta"), vec!["{Sta}rts With"]);
//! ```

use chrono::Utc;
use log::debug;

use super::combinator::Conjunction;
use super::node::{join, Node, Operator, Tree, ValueContext};
use super::timestring::resolve_timestamp;
use super::value::Value;

/// How a text operator shapes the typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Exact,
    Prefix,
    Suffix,
    Infix,
}

struct TextOperator {
    name: &'static str,
    operator: Operator,
    shape: Shape,
    placeholder: &'static str,
}

static TEXT_OPERATORS: [TextOperator; 9] = [
    TextOperator {
        name: "Is",
        operator: Operator::Equals,
        shape: Shape::Exact,
        placeholder: "value",
    },
    TextOperator {
        name: "Is Not",
        operator: Operator::EqualsNot,
        shape: Shape::Exact,
        placeholder: "value",
    },
    TextOperator {
        name: "Starts With",
        operator: Operator::Equals,
        shape: Shape::Prefix,
        placeholder: "value...",
    },
    TextOperator {
        name: "Ends With",
        operator: Operator::Equals,
        shape: Shape::Suffix,
        placeholder: "...value",
    },
    TextOperator {
        name: "Contains",
        operator: Operator::Equals,
        shape: Shape::Infix,
        placeholder: "...value...",
    },
    TextOperator {
        name: "=",
        operator: Operator::Equals,
        shape: Shape::Exact,
        placeholder: "value",
    },
    TextOperator {
        name: "!=",
        operator: Operator::EqualsNot,
        shape: Shape::Exact,
        placeholder: "value",
    },
    TextOperator {
        name: "Like",
        operator: Operator::Equals,
        shape: Shape::Exact,
        placeholder: "...value...",
    },
    TextOperator {
        name: "Matches",
        operator: Operator::Equals,
        shape: Shape::Infix,
        placeholder: "...value...",
    },
];

static TIME_OPERATORS: [(&str, Operator); 2] =
    [("Since", Operator::GreaterEq), ("Before", Operator::LessEq)];

/// Example time spans proposed after `since`/`before`.
const TIME_EXAMPLES: [&str; 6] = [
    "\"5 minutes\"",
    "\"30 minutes\"",
    "\"1 hour\"",
    "\"6 hours\"",
    "\"1 day\"",
    "\"yesterday\"",
];

/// Free-text attribute: `is`, `is not`, `starts with`, `ends with`,
/// `contains`, `like`, `matches`, `=` and `!=`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSearch;

impl TextSearch {
    /// Returns the operator phrases.
    pub fn operators(&self) -> Vec<String> {
        TEXT_OPERATORS.iter().map(|op| op.name.to_string()).collect()
    }

    /// Proposes operators, or a value placeholder once an operator is typed.
    pub fn proposals(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return self.operators();
        }
        let mut proposals = Vec::new();
        for op in &TEXT_OPERATORS {
            if op.name.eq_ignore_ascii_case(query) {
                proposals.push(format!("'{}'", op.placeholder));
            } else if starts_with_ci(op.name, query) {
                proposals.push(mark_difference(op.name, query));
            }
        }
        proposals
    }

    /// Builds `column <op> value`; `contains x` becomes `column=*x*`.
    pub fn condition(&self, query: &str, column: &str) -> Option<Node> {
        let (op, rest) = TEXT_OPERATORS
            .iter()
            .filter_map(|op| strip_operator(query, op.name).map(|rest| (op, rest)))
            .max_by_key(|(op, _)| op.name.len())?;
        let value = unquote(rest);
        if value.is_empty() {
            return None;
        }
        let value = match op.shape {
            Shape::Exact => value.to_string(),
            Shape::Prefix => format!("{value}*"),
            Shape::Suffix => format!("*{value}"),
            Shape::Infix => format!("*{value}*"),
        };
        Some(Node::condition(column, op.operator, vec![Value::from(value)], None))
    }
}

/// `since <time>` / `before <time>` clause on a timestamp column.
///
/// A bare number is read as a span into the past after `since` and into
/// the future after `before`, unless a direction is forced.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRangeSearch {
    forced_sign: Option<char>,
}

impl TimeRangeSearch {
    /// Reads bare numbers as spans into the past.
    pub fn force_past(mut self) -> Self {
        self.forced_sign = Some('-');
        self
    }

    /// Reads bare numbers as spans into the future.
    pub fn force_future(mut self) -> Self {
        self.forced_sign = Some('+');
        self
    }

    /// Returns the operator phrases.
    pub fn operators(&self) -> Vec<String> {
        TIME_OPERATORS.iter().map(|(name, _)| name.to_string()).collect()
    }

    /// Proposes `Since`/`Before`, then example time spans.
    pub fn proposals(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return self.operators();
        }
        let mut proposals = Vec::new();
        for &(name, _) in &TIME_OPERATORS {
            if let Some(rest) = strip_prefix_ci(query, name) {
                if rest.trim().is_empty() {
                    proposals.extend(TIME_EXAMPLES.iter().map(|example| example.to_string()));
                }
            } else if starts_with_ci(name, query) {
                proposals.push(mark_difference(name, query));
            }
        }
        proposals
    }

    /// Builds `column >= time` or `column <= time` with the time-string context.
    ///
    /// Returns `None` if the time cannot be resolved.
    pub fn condition(&self, query: &str, column: &str) -> Option<Node> {
        let (operator, rest) = TIME_OPERATORS
            .iter()
            .find_map(|(name, op)| strip_operator(query.trim(), name).map(|rest| (*op, rest)))?;
        let text = rest.trim().trim_matches(['\'', '"']).trim();
        if text.is_empty() {
            return None;
        }
        let text = if text.starts_with(|c: char| c.is_ascii_digit()) {
            let sign = self.forced_sign.unwrap_or(if operator == Operator::GreaterEq {
                '-'
            } else {
                '+'
            });
            format!("{sign}{text}")
        } else {
            text.to_string()
        };
        if resolve_timestamp(&text, Utc::now()).is_none() {
            debug!("cannot resolve search time {text:?}");
            return None;
        }
        Some(Node::condition(
            column,
            operator,
            vec![Value::from(text)],
            Some(ValueContext::TimeString),
        ))
    }
}

/// Flag attribute: `is <label>` / `is not <label>` over several boolean
/// columns, optionally followed by a time range on a timestamp column.
#[derive(Debug, Clone)]
pub struct BooleanSearch {
    flags: Vec<(String, String)>,
    positive: String,
    negative: String,
    time_column: Option<String>,
    time: TimeRangeSearch,
}

impl BooleanSearch {
    /// Creates a search over `(column, label)` flags, e.g.
    /// `("host_problem", "With Problem")`.
    pub fn new<I, C, L>(flags: I) -> Self
    where
        I: IntoIterator<Item = (C, L)>,
        C: Into<String>,
        L: Into<String>,
    {
        Self {
            flags: flags
                .into_iter()
                .map(|(column, label)| (column.into(), label.into()))
                .collect(),
            positive: "Is".to_string(),
            negative: "Is Not".to_string(),
            time_column: None,
            time: TimeRangeSearch::default(),
        }
    }

    /// Replaces the `Is`/`Is Not` phrases.
    pub fn with_operators(mut self, positive: impl Into<String>, negative: impl Into<String>) -> Self {
        self.positive = positive.into();
        self.negative = negative.into();
        self
    }

    /// Allows a trailing `since`/`before` clause on `column`.
    pub fn with_time_column(mut self, column: impl Into<String>) -> Self {
        self.time_column = Some(column.into());
        self
    }

    /// Returns the operator phrases.
    pub fn operators(&self) -> Vec<String> {
        vec![self.positive.clone(), self.negative.clone()]
    }

    /// Proposes operators, then flag labels or columns, then time ranges.
    pub fn proposals(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return self.operators();
        }
        let mut proposals = Vec::new();
        for operator in [&self.positive, &self.negative] {
            if operator.eq_ignore_ascii_case(query) {
                proposals.extend(self.flags.iter().map(|(_, label)| label.clone()));
            } else if starts_with_ci(operator, query) {
                proposals.push(mark_difference(operator, query));
            } else if let Some(rest) = strip_prefix_ci(query, operator) {
                proposals.extend(self.flag_proposals(rest.trim()));
            }
        }
        proposals
    }

    fn flag_proposals(&self, query: &str) -> Vec<String> {
        let mut proposals = Vec::new();
        for (column, label) in &self.flags {
            let matches = |name: &str| starts_with_ci(name, query) || starts_with_ci(query, name);
            let name = if matches(label.as_str()) {
                label
            } else if matches(column.as_str()) {
                column
            } else {
                continue;
            };
            match (strip_prefix_ci(query, name), &self.time_column) {
                (Some(rest), Some(_)) => proposals.extend(self.time.proposals(rest.trim())),
                _ if !query.eq_ignore_ascii_case(name) => {
                    proposals.push(mark_difference(name, query));
                }
                _ => {}
            }
        }
        proposals
    }

    /// Builds `column=1` for `is <label>` and `column=0` for `is not <label>`,
    /// ANDed after the time range if one follows.
    pub fn condition(&self, query: &str, _column: &str) -> Option<Node> {
        let (flag, rest) = [(&self.positive, true), (&self.negative, false)]
            .into_iter()
            .filter_map(|(operator, flag)| {
                strip_operator(query.trim(), operator).map(|rest| (flag, operator.len(), rest))
            })
            .max_by_key(|(_, len, _)| *len)
            .map(|(flag, _, rest)| (flag, rest.trim()))?;
        let (column, label) = self
            .flags
            .iter()
            .find(|(_, label)| starts_with_ci(rest, label))?;

        let node = Node::condition(column.clone(), Operator::Equals, vec![Value::Bool(flag)], None);
        let tail = rest[label.len()..].trim();
        if tail.is_empty() {
            return Some(node);
        }
        let time_column = self.time_column.as_deref()?;
        let time = self.time.condition(tail, time_column)?;
        Some(Node::and(time, node))
    }
}

/// The typed clause an attribute accepts.
#[derive(Debug, Clone)]
pub enum SearchType {
    /// Free text.
    Text(TextSearch),
    /// Boolean flags.
    Boolean(BooleanSearch),
    /// A time range.
    TimeRange(TimeRangeSearch),
}

impl SearchType {
    /// Returns the operator phrases.
    pub fn operators(&self) -> Vec<String> {
        match self {
            SearchType::Text(search) => search.operators(),
            SearchType::Boolean(search) => search.operators(),
            SearchType::TimeRange(search) => search.operators(),
        }
    }

    /// Proposes completions for a clause.
    pub fn proposals(&self, query: &str) -> Vec<String> {
        match self {
            SearchType::Text(search) => search.proposals(query),
            SearchType::Boolean(search) => search.proposals(query),
            SearchType::TimeRange(search) => search.proposals(query),
        }
    }

    /// Turns a clause into a condition on `column`.
    pub fn condition(&self, query: &str, column: &str) -> Option<Node> {
        match self {
            SearchType::Text(search) => search.condition(query, column),
            SearchType::Boolean(search) => search.condition(query, column),
            SearchType::TimeRange(search) => search.condition(query, column),
        }
    }

    /// Returns true if the clause can be turned into a condition.
    pub fn is_valid(&self, query: &str) -> bool {
        self.condition(query, "").is_some()
    }
}

/// An attribute of a domain, addressed by one of its names.
///
/// An attribute without names accepts every clause; boolean attributes
/// are usually nameless (`host is flapping`).
#[derive(Debug, Clone)]
pub struct SearchAttribute {
    kind: SearchType,
    names: Vec<String>,
    column: Option<String>,
}

impl SearchAttribute {
    /// Creates a nameless attribute of the given type.
    pub fn new(kind: SearchType) -> Self {
        Self {
            kind,
            names: Vec::new(),
            column: None,
        }
    }

    /// Creates a free-text attribute.
    pub fn text() -> Self {
        Self::new(SearchType::Text(TextSearch))
    }

    /// Creates a time-range attribute.
    pub fn time_range() -> Self {
        Self::new(SearchType::TimeRange(TimeRangeSearch::default()))
    }

    /// Creates a boolean flag attribute.
    pub fn boolean(search: BooleanSearch) -> Self {
        Self::new(SearchType::Boolean(search))
    }

    /// Sets the names typed for this attribute. The first one is also the
    /// column unless [`SearchAttribute::with_column`] sets another.
    pub fn handles<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(|name| name.into().trim().to_string()).collect();
        if self.column.is_none() {
            self.column = self.names.first().cloned();
        }
        self
    }

    /// Sets the column conditions are built on.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    fn matching_name(&self, query: &str) -> Option<&str> {
        self.names
            .iter()
            .map(String::as_str)
            .find(|name| starts_with_ci(query, name))
    }

    /// Returns true if the query starts with one of the attribute's names.
    pub fn handles_query(&self, query: &str) -> bool {
        self.matching_name(query.trim()).is_some()
    }

    /// Proposes the attribute name, or the clause completions after it.
    pub fn proposals(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        match self.matching_name(query) {
            Some(name) => self.kind.proposals(query[name.len()..].trim()),
            None if self.names.is_empty() => self.kind.proposals(query),
            None if query.is_empty() => self.names.iter().take(1).cloned().collect(),
            None => self
                .names
                .iter()
                .find(|name| starts_with_ci(name, query))
                .map(|name| mark_difference(name, query))
                .into_iter()
                .collect(),
        }
    }

    /// Turns `<name> <clause>` into a condition.
    pub fn condition(&self, query: &str) -> Option<Node> {
        let query = query.trim();
        let clause = match self.matching_name(query) {
            Some(name) => query[name.len()..].trim(),
            None if self.names.is_empty() => query,
            None => return None,
        };
        self.kind.condition(clause, self.column.as_deref().unwrap_or_default())
    }
}

/// A group of attributes addressed by a label such as `Host`.
#[derive(Debug, Clone)]
pub struct SearchDomain {
    label: String,
    attributes: Vec<SearchAttribute>,
}

impl SearchDomain {
    /// Creates an empty domain.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into().trim().to_string(),
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, attribute: SearchAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Returns the label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns true if the query starts with the label.
    pub fn handles_query(&self, query: &str) -> bool {
        starts_with_ci(query.trim(), &self.label)
    }

    fn strip_label<'q>(&self, query: &'q str) -> &'q str {
        let query = query.trim();
        strip_prefix_ci(query, &self.label).unwrap_or(query).trim()
    }

    /// Proposes completions from every attribute.
    pub fn proposals(&self, query: &str) -> Vec<String> {
        let rest = self.strip_label(query);
        self.attributes
            .iter()
            .flat_map(|attribute| attribute.proposals(rest))
            .collect()
    }

    /// Returns the condition of the first attribute that understands the query.
    pub fn condition(&self, query: &str) -> Option<Node> {
        let rest = self.strip_label(query);
        self.attributes
            .iter()
            .find_map(|attribute| attribute.condition(rest))
    }
}

/// Outcome of a search box query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Conditions of every understood part.
    pub tree: Tree,
    /// Parts no domain understood, in input order.
    pub ignored: Vec<String>,
}

/// Search box over several domains.
///
/// Parts without a domain label go to the default domain, which is the
/// first one unless [`SearchBox::with_default_domain`] picks another.
#[derive(Debug, Clone, Default)]
pub struct SearchBox {
    domains: Vec<SearchDomain>,
    default_domain: Option<usize>,
}

impl SearchBox {
    /// Creates a search box without domains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a domain.
    pub fn with_domain(mut self, domain: SearchDomain) -> Self {
        self.domains.push(domain);
        self
    }

    /// Picks the default domain by label; unknown labels are ignored.
    pub fn with_default_domain(mut self, label: &str) -> Self {
        self.default_domain = self
            .domains
            .iter()
            .position(|domain| domain.label.eq_ignore_ascii_case(label));
        self
    }

    /// Returns the default domain.
    pub fn default_domain(&self) -> Option<&SearchDomain> {
        match self.default_domain {
            Some(index) => self.domains.get(index),
            None => self.domains.first(),
        }
    }

    fn domain_for(&self, part: &str) -> Option<&SearchDomain> {
        self.domains
            .iter()
            .find(|domain| domain.handles_query(part))
            .or_else(|| self.default_domain())
    }

    /// Proposes completions for the part after the last `and`/`or`.
    pub fn proposals(&self, query: &str) -> Vec<String> {
        let part = last_part(query);
        let mut proposals: Vec<String> = self
            .domains
            .iter()
            .filter(|domain| domain.handles_query(part))
            .flat_map(|domain| domain.proposals(part))
            .collect();

        if proposals.is_empty() {
            if let Some(default) = self.default_domain() {
                for domain in &self.domains {
                    if part.is_empty() {
                        proposals.push(domain.label.clone());
                    } else if starts_with_ci(&domain.label, part) {
                        proposals.push(mark_difference(&domain.label, part));
                    }
                }
                proposals.extend(default.proposals(part));
            }
        }
        proposals
    }

    /// Parses a search box query. `and` binds tighter than `or`; parts that
    /// no domain understands are skipped and reported.
    pub fn parse(&self, query: &str) -> SearchResult {
        let mut ignored = Vec::new();
        let mut any: Option<Node> = None;
        let mut all: Option<Node> = None;
        let mut previous = Conjunction::All;

        for (part, next) in split_parts(query) {
            let node = self.domain_for(part).and_then(|domain| domain.condition(part));
            if node.is_none() && !part.is_empty() {
                debug!("ignoring search part {part:?}");
                ignored.push(part.to_string());
            }
            if previous == Conjunction::Any {
                any = join(any, all.take(), Node::or);
            }
            all = join(all, node, Node::and);
            previous = next.unwrap_or(Conjunction::All);
        }

        SearchResult {
            tree: Tree::new(join(any, all, Node::or)),
            ignored,
        }
    }
}

/// Splits at `and`/`or` words outside quotes, keeping the conjunction that
/// follows each part.
fn split_parts(query: &str) -> Vec<(&str, Option<Conjunction>)> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote = None;
    let mut at_word_start = true;
    let mut chars = query.char_indices();

    while let Some((i, c)) = chars.next() {
        if let Some(open) = quote {
            if c == open {
                quote = None;
            }
            at_word_start = false;
            continue;
        }
        if c == '\'' || c == '"' {
            quote = Some(c);
            at_word_start = false;
            continue;
        }
        if at_word_start {
            if let Some((keyword, conjunction)) = conjunction_at(&query[i..]) {
                parts.push((query[start..i].trim(), Some(conjunction)));
                start = i + keyword.len();
                // Keywords are ASCII, one char per byte
                for _ in 1..keyword.len() {
                    chars.next();
                }
                at_word_start = false;
                continue;
            }
        }
        at_word_start = c.is_whitespace();
    }

    parts.push((query[start..].trim(), None));
    parts
}

fn conjunction_at(text: &str) -> Option<(&'static str, Conjunction)> {
    [("and", Conjunction::All), ("or", Conjunction::Any)]
        .into_iter()
        .find(|(keyword, _)| {
            strip_prefix_ci(text, keyword)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        })
}

fn last_part(query: &str) -> &str {
    split_parts(query).last().map(|(part, _)| *part).unwrap_or_default()
}

/// Strips `prefix` from `text`, ignoring ASCII case.
fn strip_prefix_ci<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

fn starts_with_ci(text: &str, prefix: &str) -> bool {
    strip_prefix_ci(text, prefix).is_some()
}

/// Strips an operator phrase; a word operator must end at a word boundary.
fn strip_operator<'t>(text: &'t str, name: &str) -> Option<&'t str> {
    let rest = strip_prefix_ci(text, name)?;
    let word = name.ends_with(|c: char| c.is_alphanumeric());
    if word && rest.starts_with(|c: char| c.is_alphanumeric()) {
        return None;
    }
    Some(rest)
}

/// Trims whitespace and one pair of surrounding quotes.
fn unquote(value: &str) -> &str {
    let value = value.trim();
    let value = value.strip_prefix(['\'', '"']).unwrap_or(value);
    value.strip_suffix(['\'', '"']).unwrap_or(value)
}

/// Wraps the typed prefix of a proposal in braces: `{Sta}rts With`.
fn mark_difference(proposal: &str, typed: &str) -> String {
    match proposal.get(..typed.len()) {
        Some(head) if !typed.is_empty() => format!("{{{head}}}{}", &proposal[typed.len()..]),
        _ => proposal.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_search() -> SearchBox {
        SearchBox::new().with_domain(
            SearchDomain::new("host")
                .with_attribute(SearchAttribute::text().handles(["name"]))
                .with_attribute(SearchAttribute::text().handles(["test"])),
        )
    }

    fn flags() -> BooleanSearch {
        BooleanSearch::new([("host_problem", "With Problem"), ("host_is_flapping", "Flapping")])
    }

    fn text(column: &str, operator: Operator, value: &str) -> Node {
        Node::condition(column, operator, vec![Value::from(value)], None)
    }

    fn flag(column: &str, value: bool) -> Node {
        Node::condition(column, Operator::Equals, vec![Value::Bool(value)], None)
    }

    // ==================== Text ====================

    #[test]
    fn test_text_operator_proposals() {
        let search = host_search();
        assert!(search.proposals("Host name Is something").is_empty());
        assert_eq!(search.proposals("Host Name Starts"), vec!["{Starts} With"]);
        assert_eq!(
            search.proposals("Host name Is test and Hostname contains"),
            vec!["'...value...'"]
        );
        assert_eq!(TextSearch.proposals("is"), vec!["'value'", "{Is} Not"]);
        assert_eq!(TextSearch.proposals("").len(), TEXT_OPERATORS.len());
    }

    #[test]
    fn test_text_clauses_build_wildcards() {
        let search = TextSearch;
        assert_eq!(
            search.condition("contains web", "name"),
            Some(text("name", Operator::Equals, "*web*"))
        );
        assert_eq!(
            search.condition("Starts With web", "name"),
            Some(text("name", Operator::Equals, "web*"))
        );
        assert_eq!(
            search.condition("ends with .org", "name"),
            Some(text("name", Operator::Equals, "*.org"))
        );
        assert_eq!(
            search.condition("is not 'Hans wurst'", "name"),
            Some(text("name", Operator::EqualsNot, "Hans wurst"))
        );
        assert_eq!(
            search.condition("!= x", "name"),
            Some(text("name", Operator::EqualsNot, "x"))
        );
    }

    #[test]
    fn test_text_clause_needs_value_and_word_boundary() {
        assert_eq!(TextSearch.condition("contains", "name"), None);
        assert_eq!(TextSearch.condition("contains ''", "name"), None);
        assert_eq!(
            TextSearch.condition("is nothing", "name"),
            Some(text("name", Operator::Equals, "nothing"))
        );
        assert_eq!(TextSearch.condition("isnt x", "name"), None);
    }

    // ==================== Boolean ====================

    #[test]
    fn test_boolean_operator_proposals() {
        let search = BooleanSearch::new(Vec::<(String, String)>::new());
        assert_eq!(search.proposals(""), search.operators());
    }

    #[test]
    fn test_boolean_flag_proposals() {
        let search = flags();
        assert_eq!(search.proposals("is"), vec!["With Problem", "Flapping", "{Is} Not"]);
        assert_eq!(search.proposals("is with"), vec!["{With} Problem"]);
        assert_eq!(search.proposals("is host_pr"), vec!["{host_pr}oblem"]);
    }

    #[test]
    fn test_boolean_time_range_proposals() {
        let search = flags().with_time_column("time_field");
        assert_eq!(search.proposals("is with problem"), vec!["Since", "Before"]);
        assert_eq!(search.proposals("is with problem s"), vec!["{S}ince"]);
    }

    #[test]
    fn test_boolean_validation() {
        let search = SearchType::Boolean(flags());
        assert!(search.is_valid("is with problem"));
        assert!(!search.is_valid("is problem"));
        assert!(!search.is_valid("is with problem since 1 hour"));
    }

    #[test]
    fn test_boolean_conditions() {
        let search = flags();
        assert_eq!(
            search.condition("is with problem", "host_status"),
            Some(flag("host_problem", true))
        );
        assert_eq!(
            search.condition("is not with problem", "host_status"),
            Some(flag("host_problem", false))
        );
        assert_eq!(search.condition("Is Flapping", "host_status"), Some(flag("host_is_flapping", true)));
    }

    #[test]
    fn test_boolean_condition_with_time_range() {
        let search = flags().with_time_column("time_node");
        let node = search.condition("is with problem since 1 hour", "host_status");
        let time = Node::condition(
            "time_node",
            Operator::GreaterEq,
            vec![Value::from("-1 hour")],
            Some(ValueContext::TimeString),
        );
        assert_eq!(node, Some(Node::and(time, flag("host_problem", true))));
        assert_eq!(search.condition("is with problem since whenever", "host_status"), None);
    }

    #[test]
    fn test_custom_boolean_phrases() {
        let search = flags().with_operators("Has", "Has No");
        assert_eq!(search.operators(), vec!["Has", "Has No"]);
        assert_eq!(search.condition("has no flapping", ""), Some(flag("host_is_flapping", false)));
    }

    // ==================== Time Ranges ====================

    #[test]
    fn test_time_range_proposals() {
        let search = TimeRangeSearch::default();
        assert_eq!(search.proposals(""), vec!["Since", "Before"]);
        assert_eq!(search.proposals("be"), vec!["{Be}fore"]);
        assert_eq!(search.proposals("since").len(), TIME_EXAMPLES.len());
        assert!(search.proposals("since ").contains(&"\"yesterday\"".to_string()));
    }

    #[test]
    fn test_time_range_conditions() {
        let search = TimeRangeSearch::default();
        let time = |op, value: &str| {
            Some(Node::condition(
                "last_check",
                op,
                vec![Value::from(value)],
                Some(ValueContext::TimeString),
            ))
        };
        assert_eq!(
            search.condition("since \"yesterday\"", "last_check"),
            time(Operator::GreaterEq, "yesterday")
        );
        assert_eq!(search.condition("since 2 hours", "last_check"), time(Operator::GreaterEq, "-2 hours"));
        assert_eq!(search.condition("before 1 day", "last_check"), time(Operator::LessEq, "+1 day"));
        assert_eq!(
            search.force_past().condition("before 1 day", "last_check"),
            time(Operator::LessEq, "-1 day")
        );
        assert_eq!(search.condition("since", "last_check"), None);
        assert_eq!(search.condition("since sometime", "last_check"), None);
    }

    // ==================== Search Box ====================

    #[test]
    fn test_single_part_builds_one_condition() {
        let result = host_search().parse("Host name is not 'Hans wurst'");
        assert_eq!(
            result.tree,
            Tree::from(text("name", Operator::EqualsNot, "Hans wurst"))
        );
        assert!(result.ignored.is_empty());
    }

    #[test]
    fn test_and_query_builds_and_node() {
        let result = host_search().parse("Host name is not 'Hans wurst' and Host test contains something");
        assert_eq!(
            result.tree,
            Tree::from(Node::and(
                text("name", Operator::EqualsNot, "Hans wurst"),
                text("test", Operator::Equals, "*something*"),
            ))
        );
        assert!(result.ignored.is_empty());
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let result = host_search().parse("name is a or name is b and test is c");
        assert_eq!(
            result.tree,
            Tree::from(Node::or(
                text("name", Operator::Equals, "a"),
                Node::and(
                    text("name", Operator::Equals, "b"),
                    text("test", Operator::Equals, "c"),
                ),
            ))
        );
    }

    #[test]
    fn test_quoted_conjunction_is_kept() {
        let result = host_search().parse("host name is 'cats and dogs'");
        assert_eq!(result.tree, Tree::from(text("name", Operator::Equals, "cats and dogs")));
    }

    #[test]
    fn test_unknown_parts_are_ignored() {
        let result = host_search().parse("host name is a and host colour is blue");
        assert_eq!(result.tree, Tree::from(text("name", Operator::Equals, "a")));
        assert_eq!(result.ignored, vec!["host colour is blue"]);
    }

    #[test]
    fn test_domain_labels_are_proposed() {
        let search = host_search().with_domain(
            SearchDomain::new("Service")
                .with_attribute(SearchAttribute::boolean(flags()))
                .with_attribute(SearchAttribute::time_range().handles(["last check"]).with_column("last_check")),
        );
        assert_eq!(search.proposals("")[..2], ["host", "Service"]);
        assert_eq!(search.proposals("a=1 and Serv")[0], "{Serv}ice");
        assert_eq!(search.proposals("service last check si"), vec!["{Si}nce"]);

        let result = search.parse("service is flapping and service last check since 5 minutes");
        assert_eq!(result.tree.conditions().len(), 2);
        assert_eq!(result.tree.conditions()[1].values, vec![Value::from("-5 minutes")]);
    }

    #[test]
    fn test_split_parts() {
        let parts = split_parts("a is x AND b is y or c andor d");
        assert_eq!(
            parts,
            vec![
                ("a is x", Some(Conjunction::All)),
                ("b is y", Some(Conjunction::Any)),
                ("c andor d", None),
            ]
        );
        assert_eq!(last_part("a is x and "), "");
    }

    #[test]
    fn test_mark_difference() {
        assert_eq!(mark_difference("Starts With", "sta"), "{Sta}rts With");
        assert_eq!(mark_difference("Host", ""), "Host");
    }
}
