//! Command dispatch module for routing CLI commands to their handlers.
//!
//! Each parsed command is borrowed into a [`Dispatch`] variant holding just
//! the arguments its handler needs.

use crate::cli::{Cli, Commands, ConfigCommands, PrecedenceArg, Shell};
use crate::commands::{self, CommandContext, CommandError, Result};

/// Trait for commands that can be executed.
pub trait RunCommand {
    /// Execute the command.
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// A parsed command and its arguments.
#[derive(Debug)]
pub enum Dispatch<'a> {
    Parse {
        query: &'a str,
        strict: bool,
        precedence: Option<PrecedenceArg>,
    },
    Match {
        query: &'a str,
        rows: &'a str,
        now: Option<&'a str>,
        count: bool,
        precedence: Option<PrecedenceArg>,
    },
    Compile {
        query: &'a str,
        backend: Option<crate::cli::BackendArg>,
        now: Option<&'a str>,
        precedence: Option<PrecedenceArg>,
    },
    Propose {
        query: &'a str,
        columns: &'a [String],
    },
    Config(&'a Option<ConfigCommands>),
    Completions(&'a Shell),
    Help,
}

impl<'a> Dispatch<'a> {
    /// Creates a dispatch from the CLI command.
    pub fn from_cli(cli: &'a Cli) -> Self {
        match &cli.command {
            Some(Commands::Parse {
                query,
                strict,
                precedence,
            }) => Self::Parse {
                query,
                strict: *strict,
                precedence: *precedence,
            },
            Some(Commands::Match {
                query,
                rows,
                now,
                count,
                precedence,
            }) => Self::Match {
                query,
                rows,
                now: now.as_deref(),
                count: *count,
                precedence: *precedence,
            },
            Some(Commands::Compile {
                query,
                backend,
                now,
                precedence,
            }) => Self::Compile {
                query,
                backend: *backend,
                now: now.as_deref(),
                precedence: *precedence,
            },
            Some(Commands::Propose { query, column }) => Self::Propose {
                query,
                columns: column,
            },
            Some(Commands::Config { command }) => Self::Config(command),
            Some(Commands::Completions { shell }) => Self::Completions(shell),
            None => Self::Help,
        }
    }
}

impl RunCommand for Dispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Parse {
                query,
                strict,
                precedence,
            } => {
                let opts = commands::parse::ParseOptions {
                    query,
                    strict: *strict,
                    precedence: *precedence,
                };
                commands::parse::execute(ctx, &opts)
            }
            Self::Match {
                query,
                rows,
                now,
                count,
                precedence,
            } => {
                let opts = commands::matches::MatchOptions {
                    query,
                    rows,
                    now: *now,
                    count: *count,
                    precedence: *precedence,
                };
                commands::matches::execute(ctx, &opts)
            }
            Self::Compile {
                query,
                backend,
                now,
                precedence,
            } => {
                let opts = commands::compile::CompileOptions {
                    query,
                    backend: backend.map(Into::into),
                    now: *now,
                    precedence: *precedence,
                };
                commands::compile::execute(ctx, &opts)
            }
            Self::Propose { query, columns } => commands::propose::execute(ctx, query, columns),
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Completions(shell) => {
                commands::completions::execute(shell).map_err(CommandError::Io)
            }
            Self::Help => {
                if !ctx.quiet {
                    println!("ifilter - Icinga Web filter tool");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Init { force }) => commands::config::execute_init(ctx, *force),
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
    }
}
