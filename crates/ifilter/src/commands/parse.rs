//! Parse command implementation.
//!
//! Shows the canonical form and tree of a query string, and the fragments
//! that were dropped while parsing it.

use icinga_filter::filter::QueryParser;

use super::config::load_config;
use super::{CommandContext, CommandError, Result};
use crate::cli::PrecedenceArg;
use crate::output::{format_parse_json, format_parse_table};

/// Options for the parse command.
#[derive(Debug)]
pub struct ParseOptions<'a> {
    /// The query string.
    pub query: &'a str,
    /// Fail on the first dropped fragment.
    pub strict: bool,
    /// Precedence override.
    pub precedence: Option<PrecedenceArg>,
}

/// Executes the parse command.
///
/// # Errors
///
/// In strict mode, returns the first malformed fragment as a filter error.
pub fn execute(ctx: &CommandContext, opts: &ParseOptions) -> Result<()> {
    let config = load_config()?;
    let options = config.parser_options(opts.precedence);
    let result = QueryParser::parse_with(opts.query, &options);

    if opts.strict {
        if let Some(issue) = result.issues.first() {
            return Err(CommandError::Filter(issue.clone()));
        }
    }

    if ctx.json_output {
        println!("{}", format_parse_json(opts.query, &result)?);
    } else if !ctx.quiet {
        print!("{}", format_parse_table(&result, ctx.use_colors));
    }

    Ok(())
}
