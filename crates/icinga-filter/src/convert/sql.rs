//! SQL `WHERE` clause generation for the IDO database.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use serde::Serialize;

use super::{ColumnMapper, Converter};
use crate::filter::{parse_number, resolve_value, Condition, Node, Operator, Tree, Value};

/// How bound parameters are written into the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `?` (MySQL, SQLite).
    #[default]
    Question,
    /// `$1`, `$2`, ... (PostgreSQL).
    Numbered,
}

/// A bound parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    /// Integer value, also used for resolved timestamps.
    Integer(i64),
    /// Non-integral number.
    Float(f64),
    /// Text, including `LIKE` patterns.
    Text(String),
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Integer(n) => write!(f, "{n}"),
            SqlParam::Float(n) => write!(f, "{n}"),
            SqlParam::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// A SQL predicate and the parameters bound to its placeholders, in order.
///
/// An empty predicate places no constraint.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SqlPredicate {
    /// The predicate, without a leading `WHERE`.
    pub sql: String,
    /// Bound parameters.
    pub params: Vec<SqlParam>,
}

impl SqlPredicate {
    /// Returns true if the predicate places no constraint.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Returns ` WHERE <sql>` or the empty string.
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.sql)
        }
    }
}

impl fmt::Display for SqlPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
            write!(f, " -- [{}]", params.join(", "))?;
        }
        Ok(())
    }
}

/// Converts filter trees into SQL predicates.
///
/// Every literal becomes a bound parameter:
/// - `=`/`!=` on text use `LIKE`/`NOT LIKE` with `*` turned into `%`
/// - numeric values use `=`/`!=`
/// - several plain values use `IN`/`NOT IN`
/// - bare boolean conditions test the column for truthiness
/// - every `!=` form also accepts `NULL`, as a missing value equals no literal
///
/// # Example
///
/// ```
/// use icinga_filter::convert::{Converter, IdentityMapper, SqlConverter, SqlParam};
/// use icinga_filter::filter::QueryParser;
///
/// let tree = QueryParser::parse("service=*www*|ups*&state!=1").tree;
/// let predicate = SqlConverter::new().convert(&tree, &IdentityMapper);
/// assert_eq!(
///     predicate.sql,
///     "(service LIKE ? ESCAPE '\\' OR service LIKE ? ESCAPE '\\') AND (state IS NULL OR state != ?)"
/// );
/// assert_eq!(predicate.params[0], SqlParam::Text("%www%".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct SqlConverter {
    placeholder: Placeholder,
    now: DateTime<Utc>,
}

impl Default for SqlConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlConverter {
    /// Creates a converter using `?` placeholders and the current time.
    pub fn new() -> Self {
        Self {
            placeholder: Placeholder::Question,
            now: Utc::now(),
        }
    }

    /// Sets the placeholder style.
    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Sets the reference time for time strings.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

impl Converter for SqlConverter {
    type Output = SqlPredicate;

    fn convert<M: ColumnMapper + ?Sized>(&self, tree: &Tree, mapper: &M) -> SqlPredicate {
        let mut builder = SqlBuilder {
            converter: self,
            params: Vec::new(),
        };
        let sql = tree
            .root()
            .and_then(|root| builder.node(root, mapper))
            .map(|fragment| fragment.sql)
            .unwrap_or_default();
        trace!("compiled SQL predicate {sql:?} with {} params", builder.params.len());
        SqlPredicate {
            sql,
            params: builder.params,
        }
    }
}

/// A piece of SQL and whether it is a top-level `OR`.
struct Fragment {
    sql: String,
    is_or: bool,
}

impl Fragment {
    fn atom(sql: String) -> Self {
        Self { sql, is_or: false }
    }
}

struct SqlBuilder<'c> {
    converter: &'c SqlConverter,
    params: Vec<SqlParam>,
}

impl SqlBuilder<'_> {
    /// Pushes a parameter and returns its placeholder.
    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        match self.converter.placeholder {
            Placeholder::Question => "?".to_string(),
            Placeholder::Numbered => format!("${}", self.params.len()),
        }
    }

    fn node<M: ColumnMapper + ?Sized>(&mut self, node: &Node, mapper: &M) -> Option<Fragment> {
        match node {
            Node::Condition(condition) => self.condition(condition, mapper).map(Fragment::atom),
            Node::And(left, right) => {
                let left = self.node(left, mapper);
                let right = self.node(right, mapper);
                match (left, right) {
                    (Some(left), Some(right)) => Some(Fragment::atom(format!(
                        "{} AND {}",
                        group(left),
                        group(right)
                    ))),
                    (side, None) | (None, side) => side,
                }
            }
            Node::Or(left, right) => {
                let left = self.node(left, mapper);
                let right = self.node(right, mapper);
                match (left, right) {
                    (Some(left), Some(right)) => Some(Fragment {
                        sql: format!("{} OR {}", left.sql, right.sql),
                        is_or: true,
                    }),
                    (side, None) | (None, side) => side,
                }
            }
        }
    }

    fn condition<M: ColumnMapper + ?Sized>(
        &mut self,
        condition: &Condition,
        mapper: &M,
    ) -> Option<String> {
        let Some(column) = mapper.map_column(&condition.column) else {
            debug!("skipping unmapped column {:?}", condition.column);
            return None;
        };

        if let [Value::Bool(flag)] = condition.values.as_slice() {
            if condition.operator.is_equality() {
                let truthy = (condition.operator == Operator::Equals) == *flag;
                return Some(self.truthiness(&column, truthy));
            }
        }

        if condition.is_time_string() || mapper.is_timestamp(&condition.column) {
            return Some(self.timestamps(&column, condition));
        }

        let params: Vec<(SqlParam, bool)> = condition.values.iter().map(literal).collect();
        Some(self.comparison(&column, condition.operator, params))
    }

    fn truthiness(&mut self, column: &str, truthy: bool) -> String {
        let zero = self.bind(SqlParam::Integer(0));
        if truthy {
            format!("{column} <> {zero}")
        } else {
            format!("({column} IS NULL OR {column} = {zero})")
        }
    }

    /// Compares against values resolved to Unix timestamps.
    fn timestamps(&mut self, column: &str, condition: &Condition) -> String {
        let now = self.converter.now;
        let resolved: Vec<(SqlParam, bool)> = condition
            .values
            .iter()
            .filter_map(|value| match resolve_value(value, now) {
                Some(ts) => Some((SqlParam::Integer(ts), true)),
                None => {
                    debug!("cannot resolve time string {value:?} for {column}");
                    None
                }
            })
            .collect();

        if resolved.is_empty() {
            // Nothing equals an unresolvable time, so only != can hold
            return if condition.operator == Operator::EqualsNot {
                "1 = 1".to_string()
            } else {
                "1 = 0".to_string()
            };
        }
        self.comparison(column, condition.operator, resolved)
    }

    /// Emits the comparison for `(param, is_numeric)` pairs.
    fn comparison(&mut self, column: &str, operator: Operator, params: Vec<(SqlParam, bool)>) -> String {
        let sql = self.match_values(column, operator, params);
        if operator == Operator::EqualsNot {
            // NULL compares neither equal nor unequal
            format!("({column} IS NULL OR {sql})")
        } else {
            sql
        }
    }

    fn match_values(
        &mut self,
        column: &str,
        operator: Operator,
        mut params: Vec<(SqlParam, bool)>,
    ) -> String {
        if params.len() == 1 {
            let (param, numeric) = params.remove(0);
            return self.single(column, operator, param, numeric);
        }

        let wildcard = params.iter().any(|(param, _)| is_wildcard_param(param));
        if operator.is_equality() && !wildcard {
            let placeholders: Vec<String> = params
                .into_iter()
                .map(|(param, _)| self.bind(param))
                .collect();
            let keyword = if operator == Operator::Equals { "IN" } else { "NOT IN" };
            return format!("{column} {keyword} ({})", placeholders.join(", "));
        }

        // Any literal may match, except for != where none may
        let joiner = if operator == Operator::EqualsNot { " AND " } else { " OR " };
        let parts: Vec<String> = params
            .into_iter()
            .map(|(param, numeric)| self.single(column, operator, param, numeric))
            .collect();
        format!("({})", parts.join(joiner))
    }

    fn single(&mut self, column: &str, operator: Operator, param: SqlParam, numeric: bool) -> String {
        match operator {
            Operator::Equals | Operator::EqualsNot if !numeric => {
                let pattern = match param {
                    SqlParam::Text(text) => like_pattern(&text),
                    other => like_pattern(&other.to_string()),
                };
                let placeholder = self.bind(SqlParam::Text(pattern));
                let keyword = if operator == Operator::Equals { "LIKE" } else { "NOT LIKE" };
                format!("{column} {keyword} {placeholder} ESCAPE '\\'")
            }
            _ => {
                let placeholder = self.bind(param);
                format!("{column} {} {placeholder}", sql_operator(operator))
            }
        }
    }
}

/// Wraps a top-level `OR` in parentheses so it can sit under an `AND`.
fn group(fragment: Fragment) -> String {
    if fragment.is_or {
        format!("({})", fragment.sql)
    } else {
        fragment.sql
    }
}

/// Turns a literal into a parameter, flagging numeric values.
fn literal(value: &Value) -> (SqlParam, bool) {
    match value {
        Value::Bool(flag) => (SqlParam::Integer(i64::from(*flag)), true),
        Value::Number(n) => (number_param(*n), true),
        Value::String(text) if !value.is_wildcard() => {
            if let Ok(integer) = text.trim().parse::<i64>() {
                return (SqlParam::Integer(integer), true);
            }
            match parse_number(text) {
                Some(n) => (number_param(n), true),
                None => (SqlParam::Text(text.clone()), false),
            }
        }
        other => (SqlParam::Text(other.as_text().into_owned()), false),
    }
}

fn number_param(n: f64) -> SqlParam {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        SqlParam::Integer(n as i64)
    } else {
        SqlParam::Float(n)
    }
}

fn is_wildcard_param(param: &SqlParam) -> bool {
    matches!(param, SqlParam::Text(text) if text.contains('*'))
}

/// Escapes `%`, `_` and `\` and turns `*` into `%`.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '%' | '_' => {
                pattern.push('\\');
                pattern.push(c);
            }
            '*' => pattern.push('%'),
            _ => pattern.push(c),
        }
    }
    pattern
}

fn sql_operator(operator: Operator) -> &'static str {
    match operator {
        Operator::Equals => "=",
        Operator::EqualsNot => "!=",
        Operator::Greater => ">",
        Operator::GreaterEq => ">=",
        Operator::Less => "<",
        Operator::LessEq => "<=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::IdentityMapper;
    use crate::filter::{Filter, QueryParser};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap()
    }

    fn convert(query: &str) -> SqlPredicate {
        let tree = QueryParser::parse(query).tree;
        SqlConverter::new().at(now()).convert(&tree, &IdentityMapper)
    }

    fn text(s: &str) -> SqlParam {
        SqlParam::Text(s.to_string())
    }

    #[test]
    fn test_text_uses_like() {
        let predicate = convert("host=localhost");
        assert_eq!(predicate.sql, "host LIKE ? ESCAPE '\\'");
        assert_eq!(predicate.params, vec![text("localhost")]);

        let predicate = convert("host!=web*");
        assert_eq!(predicate.sql, "(host IS NULL OR host NOT LIKE ? ESCAPE '\\')");
        assert_eq!(predicate.params, vec![text("web%")]);
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(like_pattern("*www*"), "%www%");
    }

    #[test]
    fn test_numbers_bypass_like() {
        let predicate = convert("state=2&latency>=1.5");
        assert_eq!(predicate.sql, "state = ? AND latency >= ?");
        assert_eq!(predicate.params, vec![SqlParam::Integer(2), SqlParam::Float(1.5)]);
    }

    #[test]
    fn test_large_integers_bind_exactly() {
        let predicate = convert("id=9007199254740993");
        assert_eq!(predicate.sql, "id = ?");
        assert_eq!(predicate.params, vec![SqlParam::Integer(9_007_199_254_740_993)]);
    }

    #[test]
    fn test_multi_values_use_in() {
        let predicate = convert("state=1|2|3");
        assert_eq!(predicate.sql, "state IN (?, ?, ?)");
        assert_eq!(
            predicate.params,
            vec![SqlParam::Integer(1), SqlParam::Integer(2), SqlParam::Integer(3)]
        );

        let predicate = convert("host!=a|b");
        assert_eq!(predicate.sql, "(host IS NULL OR host NOT IN (?, ?))");
        assert_eq!(predicate.params, vec![text("a"), text("b")]);
    }

    #[test]
    fn test_multi_values_with_wildcards_chain() {
        let predicate = convert("host=localhost|nohost*");
        assert_eq!(
            predicate.sql,
            "(host LIKE ? ESCAPE '\\' OR host LIKE ? ESCAPE '\\')"
        );
        assert_eq!(predicate.params, vec![text("localhost"), text("nohost%")]);

        let predicate = convert("host!=a*|b*");
        assert_eq!(
            predicate.sql,
            "(host IS NULL OR (host NOT LIKE ? ESCAPE '\\' AND host NOT LIKE ? ESCAPE '\\'))"
        );
    }

    #[test]
    fn test_not_equal_accepts_null() {
        let predicate = convert("state!=1");
        assert_eq!(predicate.sql, "(state IS NULL OR state != ?)");
        assert_eq!(predicate.params, vec![SqlParam::Integer(1)]);

        let predicate = convert("a=1&b!=x|y");
        assert_eq!(predicate.sql, "a = ? AND (b IS NULL OR b NOT IN (?, ?))");

        let filter = Filter::where_time("last_check", Operator::EqualsNot, "-1 hour");
        let predicate = SqlConverter::new()
            .at(now())
            .convert(filter.tree(), &IdentityMapper);
        assert_eq!(predicate.sql, "(last_check IS NULL OR last_check != ?)");
    }

    #[test]
    fn test_negated_group_keeps_null_rows() {
        let tree = QueryParser::parse("!(host=a&state=0)").tree;
        let predicate = SqlConverter::new().convert(&tree, &IdentityMapper);
        assert_eq!(
            predicate.sql,
            "(host IS NULL OR host NOT LIKE ? ESCAPE '\\') OR (state IS NULL OR state != ?)"
        );
    }

    #[test]
    fn test_boolean_conditions_test_truthiness() {
        let predicate = convert("problem&!handled");
        assert_eq!(
            predicate.sql,
            "problem <> ? AND (handled IS NULL OR handled = ?)"
        );
        assert_eq!(predicate.params, vec![SqlParam::Integer(0), SqlParam::Integer(0)]);
    }

    #[test]
    fn test_or_under_and_is_grouped() {
        let predicate = convert("a=1&(b=2|c=3)");
        assert_eq!(predicate.sql, "a = ? AND (b = ? OR c = ?)");

        let predicate = convert("a=1&b=2|c=3");
        assert_eq!(predicate.sql, "a = ? AND b = ? OR c = ?");
    }

    #[test]
    fn test_numbered_placeholders() {
        let tree = QueryParser::parse("host=web*&state>=1").tree;
        let predicate = SqlConverter::new()
            .with_placeholder(Placeholder::Numbered)
            .convert(&tree, &IdentityMapper);
        assert_eq!(predicate.sql, "host LIKE $1 ESCAPE '\\' AND state >= $2");
    }

    #[test]
    fn test_unmapped_columns_collapse() {
        let tree = QueryParser::parse("host=web*&secret=1|state=2").tree;
        let mapper = |column: &str| (column != "secret").then(|| column.to_string());
        let predicate = SqlConverter::new().convert(&tree, &mapper);
        assert_eq!(predicate.sql, "host LIKE ? ESCAPE '\\' OR state = ?");
        assert_eq!(predicate.params.len(), 2);

        let nothing = |_: &str| -> Option<String> { None };
        let predicate = SqlConverter::new().convert(&tree, &nothing);
        assert!(predicate.is_empty());
        assert_eq!(predicate.where_clause(), "");
    }

    #[test]
    fn test_empty_tree() {
        let predicate = SqlConverter::new().convert(&Tree::empty(), &IdentityMapper);
        assert_eq!(predicate, SqlPredicate::default());
    }

    #[test]
    fn test_time_strings_resolve_to_timestamps() {
        let filter = Filter::where_time("last_check", Operator::Less, "-1 hour");
        let predicate = SqlConverter::new()
            .at(now())
            .convert(filter.tree(), &IdentityMapper);
        assert_eq!(predicate.sql, "last_check < ?");
        assert_eq!(
            predicate.params,
            vec![SqlParam::Integer(now().timestamp() - 3_600)]
        );
    }

    #[test]
    fn test_unresolvable_time_string_matches_nothing() {
        let filter = Filter::where_time("last_check", Operator::Greater, "whenever");
        let predicate = SqlConverter::new().convert(filter.tree(), &IdentityMapper);
        assert_eq!(predicate.sql, "1 = 0");
        assert!(predicate.params.is_empty());
    }

    #[test]
    fn test_values_are_never_interpolated() {
        let predicate = convert("host=x'+OR+1=1--");
        assert!(!predicate.sql.contains("OR 1"));
        assert_eq!(predicate.params, vec![text("x' OR 1")]);
    }

    #[test]
    fn test_where_clause_and_display() {
        let predicate = convert("host=a&state=1");
        assert_eq!(predicate.where_clause(), " WHERE host LIKE ? ESCAPE '\\' AND state = ?");
        assert_eq!(
            predicate.to_string(),
            "host LIKE ? ESCAPE '\\' AND state = ? -- ['a', 1]"
        );
    }
}
