//! Compile command implementation.
//!
//! Translates a query string into the predicate a backend understands,
//! using the column mapping configured for that backend.

use icinga_filter::convert::BackendKind;
use icinga_filter::filter::QueryParser;
use log::{debug, warn};

use super::config::load_config;
use super::{reference_time, CommandContext, Result};
use crate::cli::PrecedenceArg;
use crate::output::{format_predicate_json, format_predicate_table};

/// Options for the compile command.
#[derive(Debug)]
pub struct CompileOptions<'a> {
    /// The query string.
    pub query: &'a str,
    /// Backend override.
    pub backend: Option<BackendKind>,
    /// Reference time (RFC 3339).
    pub now: Option<&'a str>,
    /// Precedence override.
    pub precedence: Option<PrecedenceArg>,
}

/// Executes the compile command.
pub fn execute(ctx: &CommandContext, opts: &CompileOptions) -> Result<()> {
    let config = load_config()?;
    let now = reference_time(opts.now)?;
    let backend = opts.backend.unwrap_or_else(|| config.default_backend());

    let result = QueryParser::parse_with(opts.query, &config.parser_options(opts.precedence));
    for issue in &result.issues {
        warn!("ignoring {issue}");
    }

    let mapper = config.column_map(backend);
    let predicate = backend.compile_at(&result.tree, &mapper, now);
    debug!("compiled {} predicate: {}", backend, predicate);

    if ctx.json_output {
        println!("{}", format_predicate_json(opts.query, &predicate)?);
    } else if !ctx.quiet {
        print!("{}", format_predicate_table(&predicate, ctx.use_colors));
    }

    Ok(())
}
