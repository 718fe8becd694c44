//! Parse output formatting.

use icinga_filter::filter::{FilterError, Node, ParseResult, Value};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::{header, render_tree};

/// JSON output structure for the parse command.
#[derive(Serialize)]
pub struct ParseOutput<'a> {
    pub query: &'a str,
    pub canonical: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<NodeOutput<'a>>,
    pub issues: Vec<IssueOutput>,
}

/// JSON output structure for a tree node.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeOutput<'a> {
    Operator {
        column: &'a str,
        operator: &'static str,
        values: &'a [Value],
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        time_string: bool,
    },
    And {
        left: Box<NodeOutput<'a>>,
        right: Box<NodeOutput<'a>>,
    },
    Or {
        left: Box<NodeOutput<'a>>,
        right: Box<NodeOutput<'a>>,
    },
}

impl<'a> From<&'a Node> for NodeOutput<'a> {
    fn from(node: &'a Node) -> Self {
        match node {
            Node::Condition(condition) => NodeOutput::Operator {
                column: &condition.column,
                operator: condition.operator.token(),
                values: &condition.values,
                time_string: condition.is_time_string(),
            },
            Node::And(left, right) => NodeOutput::And {
                left: Box::new(left.as_ref().into()),
                right: Box::new(right.as_ref().into()),
            },
            Node::Or(left, right) => NodeOutput::Or {
                left: Box::new(left.as_ref().into()),
                right: Box::new(right.as_ref().into()),
            },
        }
    }
}

/// JSON output structure for a dropped fragment.
#[derive(Serialize)]
pub struct IssueOutput {
    pub position: usize,
    pub message: String,
}

impl From<&FilterError> for IssueOutput {
    fn from(issue: &FilterError) -> Self {
        Self {
            position: issue.position(),
            message: issue.to_string(),
        }
    }
}

/// Formats a parse result as JSON.
pub fn format_parse_json(query: &str, result: &ParseResult) -> Result<String, serde_json::Error> {
    let output = ParseOutput {
        query,
        canonical: result.tree.to_string(),
        tree: result.tree.root().map(NodeOutput::from),
        issues: result.issues.iter().map(IssueOutput::from).collect(),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats a parse result as text.
pub fn format_parse_table(result: &ParseResult, use_colors: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", header("Canonical", use_colors)));
    output.push_str(&format!("  {}\n\n", result.tree));

    output.push_str(&format!("{}\n", header("Tree", use_colors)));
    for line in render_tree(&result.tree, use_colors).lines() {
        output.push_str(&format!("  {line}\n"));
    }

    if !result.issues.is_empty() {
        output.push_str(&format!("\n{}\n", header("Dropped", use_colors)));
        for issue in &result.issues {
            let line = issue.to_string();
            if use_colors {
                output.push_str(&format!("  {}\n", line.yellow()));
            } else {
                output.push_str(&format!("  {line}\n"));
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use icinga_filter::filter::QueryParser;

    #[test]
    fn test_format_parse_json() {
        let result = QueryParser::parse("test=&host=web*|db*");
        let json: serde_json::Value =
            serde_json::from_str(&format_parse_json("test=&host=web*|db*", &result).unwrap())
                .unwrap();
        assert_eq!(json["canonical"], "host=web%2A|db%2A");
        assert_eq!(json["tree"]["type"], "operator");
        assert_eq!(json["tree"]["operator"], "=");
        assert_eq!(json["tree"]["values"], serde_json::json!(["web*", "db*"]));
        assert!(json["tree"].get("time_string").is_none());
        assert_eq!(json["issues"].as_array().unwrap().len(), 1);
        assert_eq!(json["issues"][0]["position"], 5);
    }

    #[test]
    fn test_format_parse_json_nested() {
        let result = QueryParser::parse("a=1&b=2");
        let json: serde_json::Value =
            serde_json::from_str(&format_parse_json("a=1&b=2", &result).unwrap()).unwrap();
        assert_eq!(json["tree"]["type"], "and");
        assert_eq!(json["tree"]["left"]["column"], "a");
        assert_eq!(json["tree"]["right"]["column"], "b");
    }

    #[test]
    fn test_format_parse_json_empty() {
        let result = QueryParser::parse("");
        let json: serde_json::Value =
            serde_json::from_str(&format_parse_json("", &result).unwrap()).unwrap();
        assert_eq!(json["canonical"], "");
        assert!(json.get("tree").is_none());
    }

    #[test]
    fn test_format_parse_table() {
        let result = QueryParser::parse("host=a&state=");
        let text = format_parse_table(&result, false);
        assert!(text.starts_with("Canonical\n  host=a\n\nTree\n  host = a\n"));
        assert!(text.contains("Dropped\n  missing value for 'state'"));
    }
}
