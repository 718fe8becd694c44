//! Propose command implementation.

use std::collections::BTreeSet;

use icinga_filter::filter::propose;

use super::config::load_config;
use super::{CommandContext, Result};
use crate::output::{format_proposals_json, format_proposals_table};

/// Executes the propose command.
///
/// Columns come from the config (allowed columns, or every mapped column)
/// plus any given on the command line.
pub fn execute(ctx: &CommandContext, query: &str, extra_columns: &[String]) -> Result<()> {
    let config = load_config()?;
    let mut columns: BTreeSet<String> = config.known_columns();
    columns.extend(extra_columns.iter().cloned());

    let proposals = propose(query, &columns);

    if ctx.json_output {
        println!("{}", format_proposals_json(&proposals)?);
    } else if !ctx.quiet {
        print!("{}", format_proposals_table(&proposals, ctx.use_colors));
    }

    Ok(())
}
