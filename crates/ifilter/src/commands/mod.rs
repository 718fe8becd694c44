//! Command implementations for the ifilter CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod compile;
pub mod completions;
pub mod config;
pub mod matches;
pub mod parse;
pub mod propose;

use chrono::{DateTime, Utc};

use crate::cli::Cli;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Filter parsing error (strict mode).
    #[error("filter error: {0}")]
    Filter(#[from] icinga_filter::filter::FilterError),

    /// Invalid command input, such as a malformed `--now`.
    #[error("invalid input: {0}")]
    Input(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    ///
    /// Colors are also disabled when `NO_COLOR` is set.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && std::env::var_os("NO_COLOR").is_none(),
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }
}

/// Parses a `--now` argument, defaulting to the current time.
pub fn reference_time(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        None => Ok(Utc::now()),
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|time| time.with_timezone(&Utc))
            .map_err(|e| CommandError::Input(format!("invalid --now '{text}': {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reference_time_rfc3339() {
        let time = reference_time(Some("2024-03-15T14:00:00+02:00")).unwrap();
        assert_eq!(time, Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_reference_time_invalid() {
        let err = reference_time(Some("yesterday")).unwrap_err();
        assert!(matches!(err, CommandError::Input(_)));
        assert!(err.to_string().contains("--now"));
    }

    #[test]
    fn test_reference_time_defaults_to_now() {
        let before = Utc::now();
        let time = reference_time(None).unwrap();
        assert!(time >= before);
    }
}
