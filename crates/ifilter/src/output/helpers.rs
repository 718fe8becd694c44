//! Common helper functions for output formatting.

use icinga_filter::filter::{Condition, Node, Tree};
use owo_colors::OwoColorize;

/// Formats a section header.
pub fn header(text: &str, use_colors: bool) -> String {
    if use_colors {
        text.green().bold().to_string()
    } else {
        text.to_string()
    }
}

/// Describes a condition with decoded values, e.g. `host = web* | db*`.
pub fn describe_condition(condition: &Condition) -> String {
    let values: Vec<String> = condition
        .values
        .iter()
        .map(|value| value.as_text().into_owned())
        .collect();
    let mut text = format!(
        "{} {} {}",
        condition.column,
        condition.operator.token(),
        values.join(" | ")
    );
    if condition.is_time_string() {
        text.push_str(" (time)");
    }
    text
}

/// Renders a tree as an indented outline, one node per line.
pub fn render_tree(tree: &Tree, use_colors: bool) -> String {
    let mut output = String::new();
    match tree.root() {
        Some(root) => render_node(root, 0, use_colors, &mut output),
        None => output.push_str("(empty: matches everything)\n"),
    }
    output
}

fn render_node(node: &Node, depth: usize, use_colors: bool, output: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Condition(condition) => {
            output.push_str(&format!("{indent}{}\n", describe_condition(condition)));
        }
        Node::And(left, right) | Node::Or(left, right) => {
            let label = if matches!(node, Node::And(..)) { "AND" } else { "OR" };
            if use_colors {
                output.push_str(&format!("{indent}{}\n", label.cyan().bold()));
            } else {
                output.push_str(&format!("{indent}{label}\n"));
            }
            render_node(left, depth + 1, use_colors, output);
            render_node(right, depth + 1, use_colors, output);
        }
    }
}
