//! Backend predicate output formatting.

use icinga_filter::convert::BackendPredicate;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::header;

/// JSON output structure for the compile command.
#[derive(Serialize)]
pub struct PredicateOutput<'a> {
    pub query: &'a str,
    pub empty: bool,
    pub predicate: &'a BackendPredicate,
}

/// Formats a compiled predicate as JSON.
pub fn format_predicate_json(
    query: &str,
    predicate: &BackendPredicate,
) -> Result<String, serde_json::Error> {
    let output = PredicateOutput {
        query,
        empty: predicate.is_empty(),
        predicate,
    };
    serde_json::to_string_pretty(&output)
}

/// Formats a compiled predicate as text.
pub fn format_predicate_table(predicate: &BackendPredicate, use_colors: bool) -> String {
    let mut output = format!("{}\n", header(predicate.kind().as_str(), use_colors));
    if predicate.is_empty() {
        let note = "(no constraint: every row matches)";
        if use_colors {
            output.push_str(&format!("  {}\n", note.dimmed()));
        } else {
            output.push_str(&format!("  {note}\n"));
        }
        return output;
    }
    match predicate {
        BackendPredicate::Ido(sql) => {
            output.push_str(&format!("  {}\n", sql.where_clause().trim_start()));
            if !sql.params.is_empty() {
                let params: Vec<String> = sql.params.iter().map(ToString::to_string).collect();
                output.push_str(&format!("  -- [{}]\n", params.join(", ")));
            }
        }
        BackendPredicate::Livestatus(query) => {
            for line in query.to_string().lines() {
                output.push_str(&format!("  {line}\n"));
            }
        }
        BackendPredicate::Statusdat(filter) => {
            output.push_str(&format!("  {filter}\n"));
        }
    }
    output
}
