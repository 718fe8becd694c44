//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the ifilter CLI.

use clap::{Parser, Subcommand, ValueEnum};
use icinga_filter::convert::BackendKind;
use icinga_filter::filter::Precedence;
use serde::{Deserialize, Serialize};

/// ifilter - Parse, evaluate and compile Icinga Web filter query strings
#[derive(Parser, Debug)]
#[command(name = "ifilter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a query string and show its canonical form and tree
    #[command(alias = "p")]
    Parse {
        /// Filter query string (e.g., "host=web*&state!=0")
        query: String,

        /// Fail on the first malformed fragment instead of dropping it
        #[arg(long)]
        strict: bool,

        /// How `&` and `|` bind (default: from config)
        #[arg(long, value_enum)]
        precedence: Option<PrecedenceArg>,
    },

    /// Filter JSON rows with a query string
    #[command(alias = "m")]
    Match {
        /// Filter query string
        query: String,

        /// File with JSON rows: an array, or one object per line ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        rows: String,

        /// Reference time for time strings (RFC 3339, default: now)
        #[arg(long)]
        now: Option<String>,

        /// Only print the number of matching rows
        #[arg(short, long)]
        count: bool,

        /// How `&` and `|` bind (default: from config)
        #[arg(long, value_enum)]
        precedence: Option<PrecedenceArg>,
    },

    /// Compile a query string into a backend predicate
    #[command(alias = "c")]
    Compile {
        /// Filter query string
        query: String,

        /// Target backend (default: from config, then ido)
        #[arg(short, long, value_enum)]
        backend: Option<BackendArg>,

        /// Reference time for time strings (RFC 3339, default: now)
        #[arg(long)]
        now: Option<String>,

        /// How `&` and `|` bind (default: from config)
        #[arg(long, value_enum)]
        precedence: Option<PrecedenceArg>,
    },

    /// Propose completions for a partially typed query
    Propose {
        /// The query typed so far
        #[arg(default_value = "")]
        query: String,

        /// Additional column to propose (repeatable)
        #[arg(short, long, action = clap::ArgAction::Append)]
        column: Vec<String>,
    },

    /// View and create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Conjunction precedence, as accepted on the command line and in the config file
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PrecedenceArg {
    /// `&` binds tighter than `|`
    AndBindsTighter,
    /// `&` and `|` apply left to right
    LeftToRight,
}

impl From<PrecedenceArg> for Precedence {
    fn from(arg: PrecedenceArg) -> Self {
        match arg {
            PrecedenceArg::AndBindsTighter => Precedence::AndBindsTighter,
            PrecedenceArg::LeftToRight => Precedence::LeftToRight,
        }
    }
}

/// Backends a query can be compiled for
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendArg {
    Ido,
    Livestatus,
    Statusdat,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Ido => BackendKind::Ido,
            BackendArg::Livestatus => BackendKind::Livestatus,
            BackendArg::Statusdat => BackendKind::Statusdat,
        }
    }
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Write a commented default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Print config file path
    Path,
}
