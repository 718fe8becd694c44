//! Match command implementation.
//!
//! Filters JSON rows read from a file or stdin.

use std::fs;
use std::io::{self, Read};

use icinga_filter::filter::{FilterContext, FilterEvaluator, QueryParser};
use log::{debug, warn};
use serde_json::Value as Json;

use super::config::load_config;
use super::{reference_time, CommandContext, Result};
use crate::cli::PrecedenceArg;
use crate::output::{format_count, format_rows_json, format_rows_table};

/// Options for the match command.
#[derive(Debug)]
pub struct MatchOptions<'a> {
    /// The query string.
    pub query: &'a str,
    /// Path to the rows, or `-` for stdin.
    pub rows: &'a str,
    /// Reference time (RFC 3339).
    pub now: Option<&'a str>,
    /// Only report the number of matches.
    pub count: bool,
    /// Precedence override.
    pub precedence: Option<PrecedenceArg>,
}

/// Executes the match command.
pub fn execute(ctx: &CommandContext, opts: &MatchOptions) -> Result<()> {
    let config = load_config()?;
    let now = reference_time(opts.now)?;

    let result = QueryParser::parse_with(opts.query, &config.parser_options(opts.precedence));
    for issue in &result.issues {
        warn!("ignoring {issue}");
    }

    let rows = read_rows(opts.rows)?;
    debug!("read {} rows from {}", rows.len(), opts.rows);

    let context =
        FilterContext::at(now).with_timestamp_columns(config.filter.timestamp_columns.iter().cloned());
    let matching = FilterEvaluator::new(&result.tree, &context).filter_rows(&rows);

    if ctx.json_output {
        println!(
            "{}",
            format_rows_json(opts.query, rows.len(), &matching, opts.count)?
        );
    } else if opts.count {
        if !ctx.quiet {
            print!("{}", format_count(matching.len(), rows.len()));
        }
    } else {
        print!("{}", format_rows_table(&matching)?);
    }

    Ok(())
}

/// Reads rows from `source`, where `-` means stdin.
fn read_rows(source: &str) -> Result<Vec<Json>> {
    let content = if source == "-" {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        content
    } else {
        fs::read_to_string(source)?
    };
    parse_rows(&content)
}

/// Parses a stream of JSON documents into rows.
///
/// Top-level arrays are flattened, so both a JSON array and one object per
/// line are accepted.
pub fn parse_rows(content: &str) -> Result<Vec<Json>> {
    let mut rows = Vec::new();
    for document in serde_json::Deserializer::from_str(content).into_iter::<Json>() {
        match document? {
            Json::Array(items) => rows.extend(items),
            row => rows.push(row),
        }
    }
    Ok(rows)
}
