//! Matching row output formatting.

use serde::Serialize;
use serde_json::Value as Json;

/// JSON output structure for the match command.
#[derive(Serialize)]
pub struct RowsOutput<'a> {
    pub query: &'a str,
    pub total: usize,
    pub matched: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<&'a [&'a Json]>,
}

/// Formats matching rows as JSON; `count_only` omits the rows themselves.
pub fn format_rows_json(
    query: &str,
    total: usize,
    rows: &[&Json],
    count_only: bool,
) -> Result<String, serde_json::Error> {
    let output = RowsOutput {
        query,
        total,
        matched: rows.len(),
        rows: (!count_only).then_some(rows),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats matching rows as text, one compact JSON document per line.
pub fn format_rows_table(rows: &[&Json]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for row in rows {
        output.push_str(&serde_json::to_string(row)?);
        output.push('\n');
    }
    Ok(output)
}

/// Formats the match count as text.
pub fn format_count(matched: usize, total: usize) -> String {
    format!("{matched} of {total} rows match\n")
}
