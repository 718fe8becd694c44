//! Completion proposals for partially typed query strings.

use serde::Serialize;

use super::node::Operator;
use super::serializer::decode_component;

/// What a proposal completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalKind {
    /// A column name.
    Column,
    /// A comparison operator.
    Operator,
}

/// A single completion for the last conjunct of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    /// What is being completed.
    pub kind: ProposalKind,
    /// The proposed token.
    pub text: String,
    /// The whole query with the proposal applied.
    pub query: String,
}

/// Proposes completions for the conjunct being typed at the end of `query`.
///
/// An empty conjunct or a column prefix yields the matching columns
/// (case-insensitive); a complete column also yields the operators. Once an
/// operator has been typed nothing is proposed, since values are free text.
///
/// # Example
///
/// ```
/// use icinga_filter::filter::{propose, ProposalKind};
///
/// let columns = ["host", "host_name", "service"];
/// let proposals = propose("state=1&ho", columns);
/// let texts: Vec<&str> = proposals.iter().map(|p| p.text.as_str()).collect();
/// assert_eq!(texts, vec!["host", "host_name"]);
/// assert_eq!(proposals[0].query, "state=1&host");
/// assert_eq!(proposals[0].kind, ProposalKind::Column);
/// ```
pub fn propose<I, S>(query: &str, columns: I) -> Vec<Proposal>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let fragment = last_fragment(query);
    let typed = fragment.trim_start().trim_start_matches('!').trim_start();
    if typed.contains(['=', '<', '>']) {
        return Vec::new();
    }

    let base = &query[..query.len() - typed.len()];
    let prefix = decode_component(typed.trim_end()).to_lowercase();
    let mut proposals = Vec::new();
    let mut complete = false;

    for column in columns {
        let column = column.as_ref();
        let lower = column.to_lowercase();
        if !lower.starts_with(&prefix) {
            continue;
        }
        complete |= !prefix.is_empty() && lower == prefix;
        proposals.push(Proposal {
            kind: ProposalKind::Column,
            text: column.to_string(),
            query: format!("{base}{column}"),
        });
    }

    if complete {
        let stem = query.trim_end();
        proposals.extend(Operator::ALL.iter().map(|op| Proposal {
            kind: ProposalKind::Operator,
            text: op.token().to_string(),
            query: format!("{stem}{}", op.token()),
        }));
    }

    proposals
}

/// Returns the text after the last conjunction or opening parenthesis.
fn last_fragment(query: &str) -> &str {
    match query.rfind(['&', '|', '(']) {
        Some(idx) => &query[idx + 1..],
        None => query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: [&str; 4] = ["host", "host_name", "service", "state"];

    fn texts(proposals: &[Proposal]) -> Vec<&str> {
        proposals.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_empty_query_proposes_all_columns() {
        assert_eq!(texts(&propose("", COLUMNS)), COLUMNS.to_vec());
        assert_eq!(texts(&propose("host=a&", COLUMNS)), COLUMNS.to_vec());
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let proposals = propose("S", COLUMNS);
        assert_eq!(texts(&proposals), vec!["service", "state"]);
        assert_eq!(proposals[1].query, "state");
    }

    #[test]
    fn test_negated_prefix_keeps_bang() {
        let proposals = propose("a=1&!ser", COLUMNS);
        assert_eq!(texts(&proposals), vec!["service"]);
        assert_eq!(proposals[0].query, "a=1&!service");
    }

    #[test]
    fn test_complete_column_proposes_operators() {
        let proposals = propose("(state", COLUMNS);
        let operators: Vec<&str> = proposals
            .iter()
            .filter(|p| p.kind == ProposalKind::Operator)
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(operators, vec!["!=", ">=", "<=", "=", ">", "<"]);
        assert!(proposals.iter().any(|p| p.query == "(state>="));
    }

    #[test]
    fn test_no_proposals_after_operator() {
        assert!(propose("host=", COLUMNS).is_empty());
        assert!(propose("state>=2", COLUMNS).is_empty());
        assert!(propose("host!=x", COLUMNS).is_empty());
    }

    #[test]
    fn test_unknown_prefix() {
        assert!(propose("xyz", COLUMNS).is_empty());
    }
}
